// directory paths
macro_rules! batch_shader_path {
    ($file:literal) => {
        concat!(
            concat!(env!("CARGO_MANIFEST_DIR"), "/assets/shaders/batch/"),
            $file
        )
    };
}

// shader files
pub(crate) const BATCH_B_FRAG: &str = include_str!(batch_shader_path!("basic.frag"));
pub(crate) const BATCH_B_VERT: &str = include_str!(batch_shader_path!("basic.vert"));
// without a version line, the header depends on the context
pub(crate) const BATCH_L_FRAG: &str = include_str!(batch_shader_path!("basic_legacy.frag"));
pub(crate) const BATCH_L_VERT: &str = include_str!(batch_shader_path!("basic_legacy.vert"));
