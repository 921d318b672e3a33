#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// At least one scenario completed and the report was written.
    Success = 0,

    /// No scenario completed, or the run failed.
    Failure = 1,

    /// Invalid CLI flags or environment overrides.
    InvalidInput = 2,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
