pub mod file;
pub mod question;

pub use file::{
    DeleteResponse, DuplicateCheck, ErrorBody, ErrorDetail, FilesResponse, GenerateResponse,
    RejectionDetail, RemoteFile,
};
pub use question::{QuestionRecord, QuestionType};
