//! Well-known names and defaults.

/// Directory created under the user's config directory.
pub const APP_DIR_NAME: &str = "shutterpost";

/// File name of the local upload cache inside [`APP_DIR_NAME`].
pub const CACHE_FILE_NAME: &str = "uploads.db";

/// Namespace used for the `namespace:checksum=<md5>` machine tag.
pub const DEFAULT_MACHINE_TAG_NAMESPACE: &str = "shutterpost";

/// Predicate of the checksum machine tag.
pub const CHECKSUM_PREDICATE: &str = "checksum";

pub const DEFAULT_SERVICE: &str = "flickr";

pub const FLICKR_SERVICE: &str = "flickr";
pub const SMUGMUG_SERVICE: &str = "smugmug";
