use std::fmt::Display;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, PartialEq)]
pub enum Error {
    Custom(String),
    ExpectedBoolean,
    ExpectedString,
    ExpectedChar,
    ExpectedNumber,
    ExpectedSigned,
    ExpectedUnsigned,
    ExpectedEmpty,
    NestedSequence,
    UnexpectedMap,
    UnexpectedBytes,
}

impl serde::de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Custom(msg) => f.write_str(msg),
            Error::ExpectedBoolean => f.write_str("expected a boolean cell"),
            Error::ExpectedString => f.write_str("expected a text cell"),
            Error::ExpectedChar => f.write_str("expected a single character"),
            Error::ExpectedNumber => f.write_str("expected a number cell"),
            Error::ExpectedSigned => f.write_str("expected an integer cell"),
            Error::ExpectedUnsigned => f.write_str("expected a non-negative integer cell"),
            Error::ExpectedEmpty => f.write_str("expected an empty cell"),
            Error::NestedSequence => f.write_str("a cell can't hold a sequence"),
            Error::UnexpectedMap => f.write_str("maps don't fit in a row"),
            Error::UnexpectedBytes => f.write_str("bytes don't fit in a cell"),
        }
    }
}

impl std::error::Error for Error {}
