//! Constants shared across the resolver, collectors and pipeline.

/// Separator between qualified-name segments.
pub const QN_SEPARATOR: &str = ".";

/// Parent QN sentinel meaning "no parent", accepted alongside the empty string.
pub const ROOT_SENTINEL: &str = ".";

/// Alias under which wildcard imports are stored.
pub const WILDCARD_ALIAS: &str = "*";

/// Worker count used when the configuration leaves it unset.
pub const DEFAULT_CONCURRENCY: usize = 4;

// Modifier names as they appear in `Extra::modifiers`.
pub const MOD_PUBLIC: &str = "public";
pub const MOD_PROTECTED: &str = "protected";
pub const MOD_PRIVATE: &str = "private";
pub const MOD_STATIC: &str = "static";
pub const MOD_FINAL: &str = "final";

// Keys of the open `mores` map.
pub const MORE_CONSTRUCTOR: &str = "constructor";
pub const MORE_RECORD_COMPONENT: &str = "record_component";
pub const MORE_LAMBDA_PARAMETERS: &str = "lambda.parameters";
pub const MORE_LAMBDA_BLOCK_BODY: &str = "lambda.is_block";
pub const MORE_METHOD_REF_RECEIVER: &str = "method_ref.receiver";
pub const MORE_METHOD_REF_TARGET: &str = "method_ref.target";
pub const MORE_ANONYMOUS_TYPE: &str = "anonymous.type";
