pub mod backend;
pub mod handlers;

pub mod paths {
    pub const WELCOME: &str = "/api";
    pub const PUBLISH: &str = "/api/publish";
    pub const PUBLISH_FILE: &str = "/api/publish_file";
    pub const GET_BLOB: &str = "/api/get_blob";
    pub const SHARD_HASHES: &str = "/api/shard_hashes";
    pub const ALT_DA_PUT: &str = "/put";
    pub const ALT_DA_GET: &str = "/get/:commitment";
    pub const ROLLKIT_SUBMIT: &str = "/rollkit/submit";
    pub const ROLLKIT_GET: &str = "/rollkit/get";
    pub const ROLLKIT_MAX_BLOB_SIZE: &str = "/rollkit/max_blob_size";
}
