use ethers::prelude::abigen;

// Typed binding for the deployed lending contract. The interface matches the
// deployment exactly: six externals, two views, five events. Interest rates
// cross this boundary in tenths of a percent, durations in seconds, amounts
// in wei.
abigen!(
    P2PLending,
    r#"[
        function createLoan(uint256 _targetAmount, uint256 _durationSeconds, uint256 _interestRate) external
        function fundLoan() external payable
        function repayLoan() external payable
        function withdrawAsLender() external
        function cancelLoan() external
        function currentLoan() external view returns (address borrower, uint256 targetAmount, uint256 durationSeconds, uint256 interestRate, uint256 fundedAt, bool canceled, bool repaid)
        function contribution(address) external view returns (uint256)
        event LoanCreated(address borrower, uint256 targetAmount, uint256 durationSeconds, uint256 interestRate)
        event LoanFunded(address lender, uint256 amount)
        event LoanRepaid(address borrower)
        event LoanCanceled(address borrower)
        event Withdrawn(address lender, uint256 amount)
    ]"#
);
