/// Names and paths used by the smart HTTP discovery request.
pub mod service {
    /// The only service this crate speaks.
    pub const UPLOAD_PACK: &str = "git-upload-pack";
    /// Path appended to the repository URL.
    pub const INFO_REFS: &str = "info/refs";
    /// Query string selecting the upload-pack service.
    pub const QUERY: &str = "service=git-upload-pack";
    /// Media type of a smart upload-pack advertisement.
    pub const ADVERTISEMENT_CONTENT_TYPE: &str = "application/x-git-upload-pack-advertisement";
}
