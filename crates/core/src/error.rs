/// Business rule violations raised while handling a test result bundle.
///
/// The display text of each variant is returned to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BundleError {
    #[error("Bundle with identifier is not allowed.")]
    IdentifierNotAllowed,
    #[error("Test Result Bundle must reference at least one Patient resource.")]
    MissingPatient,
    #[error("Test Result Bundle must not reference more than one Patient resource.")]
    MultiplePatients,
}

pub type BundleResult<T> = std::result::Result<T, BundleError>;
