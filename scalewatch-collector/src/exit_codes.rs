#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// Collection or publishing failed.
    Failure = 1,

    /// Invalid CLI flags or environment overrides.
    InvalidInput = 2,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_published(published: bool) -> Self {
        if published {
            Self::Success
        } else {
            Self::Failure
        }
    }
}
