use bitflags::bitflags;
use grit::ash::vk;

use crate::{Caps, IRect};

slotmap::new_key_type!(
    ///Key of a surface proxy within a [RenderTaskGraph](crate::RenderTaskGraph).
    pub struct ProxyKey;
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mipmapped {
    #[default]
    No,
    Yes,
}

bitflags! {
    ///Kind of resolve a proxy needs before it can be read.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResolveFlags: u8 {
        const MSAA = 0b01;
        const MIPMAPS = 0b10;
    }
}

///Description of a surface. A proxy is *renderable* if it can be a render task's target.
#[derive(Debug, Clone)]
pub struct ProxyDesc {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: vk::Format,
    pub samples: u32,
    pub mipmapped: Mipmapped,
    pub renderable: bool,
    ///Lazily uploaded proxy. Its content is scheduled for upload when a task that reads it is prepared.
    pub deferred: bool,
}

impl ProxyDesc {
    pub fn render_target(name: impl Into<String>, width: u32, height: u32) -> Self {
        ProxyDesc {
            name: name.into(),
            width,
            height,
            format: vk::Format::R8G8B8A8_UNORM,
            samples: 1,
            mipmapped: Mipmapped::No,
            renderable: true,
            deferred: false,
        }
    }

    pub fn texture(name: impl Into<String>, width: u32, height: u32) -> Self {
        ProxyDesc {
            renderable: false,
            ..Self::render_target(name, width, height)
        }
    }

    pub fn with_samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_mipmaps(mut self) -> Self {
        self.mipmapped = Mipmapped::Yes;
        self
    }

    pub fn deferred(mut self) -> Self {
        self.deferred = true;
        self
    }
}

///Deferred handle to a texture and/or render target.
///
/// Tracks whether its multisampled content and its mip maps are out of date. Both are marked dirty when a task that writes
/// the proxy is closed, and cleaned when a resolve task is scheduled for the proxy.
#[derive(Debug)]
pub struct SurfaceProxy {
    desc: ProxyDesc,
    requires_manual_msaa_resolve: bool,
    msaa_dirty_rect: IRect,
    mipmaps_dirty: bool,
    instantiated: bool,
}

impl SurfaceProxy {
    pub(crate) fn new(mut desc: ProxyDesc, caps: &Caps) -> Self {
        if desc.mipmapped == Mipmapped::Yes && !caps.mipmap_support {
            #[cfg(feature = "logging")]
            log::warn!(
                "Device has no mip map support, creating {} without mip maps",
                desc.name
            );
            desc.mipmapped = Mipmapped::No;
        }
        if desc.samples > caps.max_sample_count {
            #[cfg(feature = "logging")]
            log::warn!(
                "Clamping sample count of {} from {} to {}",
                desc.name,
                desc.samples,
                caps.max_sample_count
            );
            desc.samples = caps.max_sample_count;
        }

        let requires_manual_msaa_resolve =
            desc.renderable && desc.samples > 1 && !caps.msaa_resolves_automatically;

        SurfaceProxy {
            desc,
            requires_manual_msaa_resolve,
            msaa_dirty_rect: IRect::EMPTY,
            mipmaps_dirty: false,
            instantiated: false,
        }
    }

    pub fn desc(&self) -> &ProxyDesc {
        &self.desc
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn bounds(&self) -> IRect {
        IRect::from_wh(self.desc.width, self.desc.height)
    }

    pub fn mipmapped(&self) -> Mipmapped {
        self.desc.mipmapped
    }

    pub fn is_deferred(&self) -> bool {
        self.desc.deferred
    }

    pub fn requires_manual_msaa_resolve(&self) -> bool {
        self.requires_manual_msaa_resolve
    }

    pub fn is_instantiated(&self) -> bool {
        self.instantiated
    }

    pub(crate) fn instantiate(&mut self) {
        self.instantiated = true;
    }

    pub fn is_msaa_dirty(&self) -> bool {
        !self.msaa_dirty_rect.is_empty()
    }

    pub fn msaa_dirty_rect(&self) -> Option<IRect> {
        if self.is_msaa_dirty() {
            Some(self.msaa_dirty_rect)
        } else {
            None
        }
    }

    ///Marks `rect` as written on the multisampled surface.
    pub fn mark_msaa_dirty(&mut self, rect: IRect) {
        assert!(
            self.requires_manual_msaa_resolve,
            "{} does not need manual MSAA resolves",
            self.desc.name
        );
        self.msaa_dirty_rect.join(&rect);
    }

    ///Marks the MSAA content as resolved, returns the rectangle that was dirty.
    pub fn mark_msaa_resolved(&mut self) -> Option<IRect> {
        let dirty = self.msaa_dirty_rect();
        self.msaa_dirty_rect = IRect::EMPTY;
        dirty
    }

    pub fn mipmaps_are_dirty(&self) -> bool {
        self.mipmaps_dirty
    }

    pub fn mark_mipmaps_dirty(&mut self) {
        assert!(
            self.desc.mipmapped == Mipmapped::Yes,
            "{} has no mip maps",
            self.desc.name
        );
        self.mipmaps_dirty = true;
    }

    pub fn mark_mipmaps_clean(&mut self) {
        self.mipmaps_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_resolve_from_caps() {
        let caps = Caps::default();
        let msaa = SurfaceProxy::new(ProxyDesc::render_target("msaa", 64, 64).with_samples(4), &caps);
        assert!(msaa.requires_manual_msaa_resolve());

        let single = SurfaceProxy::new(ProxyDesc::render_target("single", 64, 64), &caps);
        assert!(!single.requires_manual_msaa_resolve());

        let auto = SurfaceProxy::new(
            ProxyDesc::render_target("auto", 64, 64).with_samples(4),
            &Caps {
                msaa_resolves_automatically: true,
                ..Default::default()
            },
        );
        assert!(!auto.requires_manual_msaa_resolve());
    }

    #[test]
    fn mipmaps_downgraded_without_support() {
        let caps = Caps {
            mipmap_support: false,
            ..Default::default()
        };
        let proxy = SurfaceProxy::new(ProxyDesc::texture("tex", 64, 64).with_mipmaps(), &caps);
        assert_eq!(proxy.mipmapped(), Mipmapped::No);
    }

    #[test]
    fn dirty_tracking() {
        let mut proxy = SurfaceProxy::new(
            ProxyDesc::render_target("rt", 64, 64)
                .with_samples(4)
                .with_mipmaps(),
            &Caps::default(),
        );
        assert!(!proxy.is_msaa_dirty());
        proxy.mark_msaa_dirty(IRect::new(0, 0, 8, 8));
        proxy.mark_msaa_dirty(IRect::new(8, 8, 16, 16));
        assert_eq!(proxy.msaa_dirty_rect(), Some(IRect::new(0, 0, 16, 16)));
        assert_eq!(proxy.mark_msaa_resolved(), Some(IRect::new(0, 0, 16, 16)));
        assert!(!proxy.is_msaa_dirty());

        proxy.mark_mipmaps_dirty();
        assert!(proxy.mipmaps_are_dirty());
        proxy.mark_mipmaps_clean();
        assert!(!proxy.mipmaps_are_dirty());
    }
}
