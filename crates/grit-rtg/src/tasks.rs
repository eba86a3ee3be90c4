mod copy;
pub use copy::CopyTask;

mod draw;
pub use draw::{Draw, DrawTask};

mod transfer;
pub use transfer::TransferTask;

use grit::resources::AttachmentsDescriptor;

use crate::{FlushError, FlushState, ProxyKey};

///Attachment layout a task uses to render into `target`.
pub(crate) fn target_attachments(
    state: &FlushState<'_>,
    task: &str,
    target: ProxyKey,
) -> Result<AttachmentsDescriptor, FlushError> {
    let proxy = state.proxy(target).ok_or_else(|| FlushError::TaskFailed {
        task: task.to_string(),
        reason: "target proxy was removed".to_string(),
    })?;
    let desc = proxy.desc();
    let mut attachments = AttachmentsDescriptor::color(desc.format, desc.samples);
    if proxy.requires_manual_msaa_resolve() {
        //Resolves are separate tasks, but the attachment layout still carries the single sampled resolve target.
        attachments = attachments.with_resolve(desc.format);
    }
    Ok(attachments)
}
