#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("unknown appointment status: {0}")]
    UnknownStatus(u8),
    #[error("appointment status {0} is terminal; no further changes are permitted")]
    TerminalStatus(u8),
    #[error("transition from status {from} to status {to} is not allowed")]
    TransitionNotAllowed { from: u8, to: u8 },
    #[error("notes are required when moving an appointment to status {0}")]
    NotesRequired(u8),
    #[error("appointment is in the past and can no longer be edited or cancelled")]
    AppointmentInPast,
    #[error("invalid transition table: {0}")]
    TransitionTable(String),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to create record directory: {0}")]
    RecordDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),

    #[error("invalid record id: {0}")]
    Uuid(#[from] clinic_uuid::UuidError),
    #[error("invalid text: {0}")]
    Text(#[from] clinic_types::TextError),
    #[error("growth reference error: {0}")]
    Growth(#[from] growth::GrowthError),
}

impl ClinicError {
    /// True for errors caused by the caller's input rather than by storage or configuration.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ClinicError::InvalidInput(_)
                | ClinicError::NotFound { .. }
                | ClinicError::UnknownStatus(_)
                | ClinicError::TerminalStatus(_)
                | ClinicError::TransitionNotAllowed { .. }
                | ClinicError::NotesRequired(_)
                | ClinicError::AppointmentInPast
                | ClinicError::Uuid(_)
                | ClinicError::Text(_)
        )
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
