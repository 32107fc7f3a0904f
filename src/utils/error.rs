use thiserror::Error;

/// Transport-level failure for a single page fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    ConnectionFailure(String),

    #[error("upstream returned HTTP {0}")]
    HttpError(u16),
}

impl FetchError {
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::HttpError(status.as_u16())
        } else {
            FetchError::ConnectionFailure(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum NutritionError {
    #[error("Unknown location: {name}. Available locations: {}", available.join(", "))]
    VenueNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("No menu data for {venue}: {detail}")]
    UpstreamUnavailable { venue: String, detail: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lookup,
    Network,
    Output,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl NutritionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            NutritionError::VenueNotFound { .. } => ErrorCategory::Lookup,
            NutritionError::UpstreamUnavailable { .. } | NutritionError::Http(_) => {
                ErrorCategory::Network
            }
            NutritionError::CsvError(_)
            | NutritionError::IoError(_)
            | NutritionError::SerializationError(_) => ErrorCategory::Output,
            NutritionError::ConfigValidationError { .. }
            | NutritionError::InvalidConfigValueError { .. }
            | NutritionError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            NutritionError::VenueNotFound { .. } => ErrorSeverity::Low,
            NutritionError::UpstreamUnavailable { .. } => ErrorSeverity::Medium,
            NutritionError::CsvError(_)
            | NutritionError::IoError(_)
            | NutritionError::SerializationError(_) => ErrorSeverity::High,
            _ => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            NutritionError::VenueNotFound { available, .. } => {
                format!("Use one of the configured locations: {}", available.join(", "))
            }
            NutritionError::UpstreamUnavailable { detail, .. } => {
                if detail.contains("timed out") {
                    "The dining site is slow to respond; try again or raise fetch.timeout_seconds"
                        .to_string()
                } else {
                    "The dining site is having trouble; try again later, or pass --expect for estimates"
                        .to_string()
                }
            }
            NutritionError::Http(_) => "Check the fetch settings (user agent, timeout)".to_string(),
            NutritionError::CsvError(_)
            | NutritionError::IoError(_)
            | NutritionError::SerializationError(_) => {
                "Check that the output directory exists and is writable".to_string()
            }
            NutritionError::ConfigValidationError { .. }
            | NutritionError::InvalidConfigValueError { .. }
            | NutritionError::MissingConfigError { .. } => {
                "Fix the configuration file and run again".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Lookup => self.to_string(),
            ErrorCategory::Network => format!("Could not reach the dining site: {}", self),
            ErrorCategory::Output => format!("Could not write results: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, NutritionError>;
