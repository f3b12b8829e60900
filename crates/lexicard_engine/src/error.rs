use thiserror::Error;

/// 违反调用约定的操作；答错不算错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    #[error("No exercise is in progress")]
    NotInProgress,

    #[error("Cannot submit an empty answer")]
    EmptyAnswer,

    #[error("\"{0}\" is not one of the options")]
    UnknownOption(String),

    #[error("Typing exercises have no options")]
    NoOptions,

    #[error("This exercise is answered by choosing an option")]
    ChoiceOnly,
}
