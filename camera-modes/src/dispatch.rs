use crate::mode::{ModeParams, ModeRegistry};
use image_effect::{Frame, ImageEffectResult, apply_chain};

/// Runs the named mode on `frame`.
///
/// The frame is brought into RGB channel order first, so the result is
/// always RGB ordered. Unknown names and modes without a transform return the
/// frame unchanged. The result may be single channel; call
/// [`Frame::into_color`] before handing it to a 3-channel sink.
pub fn apply(
    registry: &ModeRegistry,
    mode_name: &str,
    frame: Frame,
    params: &ModeParams,
) -> ImageEffectResult<Frame> {
    let frame = frame.into_rgb_order();

    let Some(mode) = registry.get(mode_name) else {
        log::warn!("unknown camera mode `{mode_name}`, showing unprocessed frame");
        return Ok(frame);
    };

    let effects = mode.effects(params);
    if effects.is_empty() {
        return Ok(frame);
    }

    log::trace!(
        "{}: {}",
        mode.name,
        effects.iter().map(|e| e.name()).collect::<Vec<_>>().join(" -> ")
    );

    apply_chain(&effects, frame)
}
