//! 渲染比例
//!
//! 配置中的 `RenderScale` 与 1.0 相差超过 [`RENDER_SCALE_EPSILON`] 且主相机存在时写入宿主。

use super::{FeatureKind, RenderContext};
use crate::core::error::{FeatureError, FeatureResult};
use crate::host::RenderParam;

pub const RENDER_SCALE_EPSILON: f32 = 0.01;

/// 应用渲染比例，返回是否修改了设置
///
/// 先恢复之前的渲染比例设置，比例接近 1.0 时保持宿主默认值。
pub fn apply_render_scale(ctx: &mut RenderContext<'_>, scale: f32) -> FeatureResult<bool> {
    ctx.restore(FeatureKind::RenderScale);
    if (scale - 1.0).abs() <= RENDER_SCALE_EPSILON {
        return Ok(false);
    }
    if ctx.host.main_camera_position().is_none() {
        return Err(FeatureError::ResourceUnavailable {
            feature: FeatureKind::RenderScale,
            resource: "main camera".to_string(),
        });
    }

    ctx.set(FeatureKind::RenderScale, RenderParam::RenderScale, scale);
    let (width, height) = ctx.host.screen_size();
    tracing::info!(
        target: "enhancer",
        "Render scale {:.2}: internal resolution {}x{}",
        scale,
        (width as f32 * scale).round() as u32,
        (height as f32 * scale).round() as u32
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Diagnostics;
    use crate::host::{ParamValue, SimulatedHost};
    use crate::ledger::SettingsLedger;

    #[test]
    fn test_near_one_is_noop() {
        let mut host = SimulatedHost::new("gpu");
        let mut ledger = SettingsLedger::new();
        let mut diagnostics = Diagnostics::new();
        let mut ctx = RenderContext::new(&mut host, &mut ledger, &mut diagnostics);

        assert!(!apply_render_scale(&mut ctx, 1.005).unwrap());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_scale_applied_and_replaced() {
        let mut host = SimulatedHost::new("gpu");
        let mut ledger = SettingsLedger::new();
        let mut diagnostics = Diagnostics::new();

        assert!(apply_render_scale(
            &mut RenderContext::new(&mut host, &mut ledger, &mut diagnostics),
            1.5
        )
        .unwrap());
        assert_eq!(host.global(RenderParam::RenderScale), ParamValue::Float(1.5));

        assert!(!apply_render_scale(
            &mut RenderContext::new(&mut host, &mut ledger, &mut diagnostics),
            1.0
        )
        .unwrap());
        assert_eq!(host.global(RenderParam::RenderScale), ParamValue::Float(1.0));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_missing_camera() {
        let mut host = SimulatedHost::new("gpu").with_camera(None);
        let mut ledger = SettingsLedger::new();
        let mut diagnostics = Diagnostics::new();
        let mut ctx = RenderContext::new(&mut host, &mut ledger, &mut diagnostics);

        assert!(matches!(
            apply_render_scale(&mut ctx, 0.75),
            Err(FeatureError::ResourceUnavailable { .. })
        ));
    }
}
