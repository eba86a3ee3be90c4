///Read-only device capabilities the graph bases its resolve decisions on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caps {
    ///If true, multisampled render targets are resolved as part of the render pass, and never need an explicit resolve task.
    pub msaa_resolves_automatically: bool,
    ///If false, every proxy is created without mip maps.
    pub mipmap_support: bool,
    pub max_sample_count: u32,
}

impl Default for Caps {
    fn default() -> Self {
        Caps {
            msaa_resolves_automatically: false,
            mipmap_support: true,
            max_sample_count: 8,
        }
    }
}
