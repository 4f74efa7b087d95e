pub mod kyc_info;
pub mod survey;
pub mod task;
pub mod user;
pub mod wallet_transaction;
pub mod withdrawal;

pub use kyc_info::Entity as KycInfoEntity;
pub use survey::Entity as SurveyEntity;
pub use task::Entity as TaskEntity;
pub use user::Entity as UserEntity;
pub use wallet_transaction::Entity as WalletTransactionEntity;
pub use withdrawal::Entity as WithdrawalEntity;
