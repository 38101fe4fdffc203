//! Rule identity and metadata

use crate::diagnostic::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of diagnostic codes the checker can emit
///
/// One rule, import-modules-only, splits into two codes depending on
/// whether the offending import is absolute or relative; the size checks
/// on try statements likewise emit separate codes for the try body and its
/// handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleCode {
    ImportModulesOnly,
    ImportFullPath,
    GlobalVariable,
    TwoArgException,
    StringException,
    CatchStandardError,
    TryTooLong,
    ExceptTooLong,
    FinallyTooLong,
}

impl RuleCode {
    /// All codes in legacy-id order
    pub const ALL: [RuleCode; 9] = [
        RuleCode::ImportModulesOnly,
        RuleCode::ImportFullPath,
        RuleCode::GlobalVariable,
        RuleCode::TwoArgException,
        RuleCode::StringException,
        RuleCode::CatchStandardError,
        RuleCode::TryTooLong,
        RuleCode::ExceptTooLong,
        RuleCode::FinallyTooLong,
    ];

    /// Stable kebab-case identifier
    pub fn id(self) -> &'static str {
        match self {
            RuleCode::ImportModulesOnly => "import-modules-only",
            RuleCode::ImportFullPath => "import-full-path",
            RuleCode::GlobalVariable => "global-variable",
            RuleCode::TwoArgException => "two-arg-exception",
            RuleCode::StringException => "string-exception",
            RuleCode::CatchStandardError => "catch-standard-error",
            RuleCode::TryTooLong => "try-too-long",
            RuleCode::ExceptTooLong => "except-too-long",
            RuleCode::FinallyTooLong => "finally-too-long",
        }
    }

    /// Numeric identifier kept for hosts that key findings the old way
    pub fn legacy_id(self) -> &'static str {
        match self {
            RuleCode::ImportModulesOnly => "C2601",
            RuleCode::ImportFullPath => "C2602",
            RuleCode::GlobalVariable => "C2603",
            RuleCode::TwoArgException => "C2604",
            RuleCode::StringException => "C2605",
            RuleCode::CatchStandardError => "C2606",
            RuleCode::TryTooLong => "C2607",
            RuleCode::ExceptTooLong => "C2608",
            RuleCode::FinallyTooLong => "C2609",
        }
    }

    /// Message template with named placeholders
    pub fn template(self) -> &'static str {
        match self {
            RuleCode::ImportModulesOnly => "{child} is not a module or cannot be imported",
            RuleCode::ImportFullPath => "{module} imported relatively",
            RuleCode::GlobalVariable => "{name} declared at the module level (i.e. global)",
            RuleCode::TwoArgException => "Raised two-argument exception",
            RuleCode::StringException => "Raised deprecated string-exception",
            RuleCode::CatchStandardError => "Caught StandardError",
            RuleCode::TryTooLong => "Try body has {found} nodes",
            RuleCode::ExceptTooLong => "Except body has {found} nodes",
            RuleCode::FinallyTooLong => "Finally body has {found} nodes",
        }
    }

    /// Longer help text shown alongside the message
    pub fn help(self) -> &'static str {
        match self {
            RuleCode::ImportModulesOnly => {
                "Only import packages or modules and ensure that they are installed."
            }
            RuleCode::ImportFullPath => "Import modules using their absolute names.",
            RuleCode::GlobalVariable => "Avoid global variables in favor of class variables.",
            RuleCode::TwoArgException => {
                "Use either raise Exception('message') or raise Exception."
            }
            RuleCode::StringException => {
                "Use either raise Exception('message') or raise Exception."
            }
            RuleCode::CatchStandardError => "Don't catch StandardError.",
            RuleCode::TryTooLong => {
                "The larger the 'try' body size, the more likely that an unexpected \
                 exception will be raised."
            }
            RuleCode::ExceptTooLong => {
                "The larger the 'except' body size, the more likely that an exception \
                 will be raised during exception handling."
            }
            RuleCode::FinallyTooLong => {
                "The larger the 'finally' body size, the more likely that an exception \
                 will be raised during resource cleanup activities."
            }
        }
    }

    /// Severity a diagnostic carries unless the configuration overrides it
    pub fn default_severity(self) -> Severity {
        match self {
            RuleCode::TwoArgException | RuleCode::StringException | RuleCode::CatchStandardError => {
                Severity::Error
            }
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for RuleCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleCode::ALL
            .iter()
            .copied()
            .find(|code| code.id() == s || code.legacy_id() == s)
            .ok_or_else(|| format!("Unknown rule: {}", s))
    }
}
