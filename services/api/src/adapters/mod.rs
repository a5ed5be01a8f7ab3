pub mod classifier_llm;
pub mod db;
pub mod file_store;
pub mod identity;

pub use classifier_llm::OpenAiClassifierAdapter;
pub use db::DbAdapter;
pub use file_store::FileStore;
pub use identity::FirebaseIdentityAdapter;
