pub mod answer_key;
pub mod credentials;
pub mod editor;
pub mod normalizer;
pub mod store;

pub use answer_key::{derive_letter, AnswerLetter};
pub use credentials::{CredentialStore, Credentials, UserInfo};
pub use editor::{apply_edit, EditFields};
pub use normalizer::{normalize, NormalizedQuestion, CHOICE_COUNT, CHOICE_LABELS};
pub use store::QuestionStore;
