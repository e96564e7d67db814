/// Name of the project manifest looked up at the project root.
pub const CONFIG_FILE_NAME: &str = "ndkpack.toml";

/// Directory (relative to the project root) receiving archives and staging trees.
pub const OUTPUT_DIR: &str = "output";

/// Directory under [`OUTPUT_DIR`] holding one staging root per variant.
pub const STAGING_DIR: &str = ".temp";

/// Manifest marking a directory as a cargo crate or workspace.
pub const CARGO_MANIFEST: &str = "Cargo.toml";

/// Cargo's target directory name.
pub const TARGET_DIR: &str = "target";

/// Sentinel marking a Termux host, where every tool is already on `PATH`.
pub const TERMUX_SENTINEL_VAR: &str = "TERMUX_VERSION";

/// Termux installation prefix.
pub const TERMUX_PREFIX_VAR: &str = "PREFIX";

/// Fallback for [`TERMUX_PREFIX_VAR`].
pub const TERMUX_DEFAULT_PREFIX: &str = "/data/data/com.termux/files/usr";

pub const NDK_HOME_VAR: &str = "ANDROID_NDK_HOME";
pub const NDK_ROOT_VAR: &str = "ANDROID_NDK_ROOT";
pub const SDK_ROOT_VAR: &str = "ANDROID_SDK_ROOT";

/// Environment variable read by bindgen for extra clang arguments.
pub const BINDGEN_CLANG_ARGS_VAR: &str = "BINDGEN_EXTRA_CLANG_ARGS";
