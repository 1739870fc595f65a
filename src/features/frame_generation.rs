//! 帧生成控制器
//!
//! 解除垂直同步、固定物理步长并设置目标帧率上限。目标帧率始终钳制在
//! [`MIN_TARGET_FPS`]..=[`MAX_TARGET_FPS`]。

use super::{FeatureController, FeatureKind, FeatureState, Lifecycle, RenderContext};
use crate::core::error::FeatureResult;
use crate::host::RenderParam;
use fidelity_engine_hardware::DeviceCapabilities;

pub const MIN_TARGET_FPS: i32 = 60;
pub const MAX_TARGET_FPS: i32 = 240;
pub const DEFAULT_TARGET_FPS: i32 = 120;

/// 启用后的固定步长
pub const FRAME_GENERATION_TIMESTEP: f32 = 1.0 / 60.0;

/// 帧率监控日志间隔（帧）
pub const FPS_LOG_INTERVAL: u64 = 300;

/// 钳制目标帧率
pub fn clamp_target_fps(fps: i32) -> i32 {
    fps.clamp(MIN_TARGET_FPS, MAX_TARGET_FPS)
}

/// 帧率监控
#[derive(Debug, Default, Clone)]
struct FrameMonitor {
    frames: u64,
    elapsed: f32,
}

impl FrameMonitor {
    /// 累计一帧，到达间隔时返回该区间的平均帧率
    fn tick(&mut self, delta_seconds: f32) -> Option<f32> {
        self.frames += 1;
        self.elapsed += delta_seconds.max(0.0);
        if self.frames % FPS_LOG_INTERVAL != 0 {
            return None;
        }
        let fps = if self.elapsed > 0.0 {
            FPS_LOG_INTERVAL as f32 / self.elapsed
        } else {
            0.0
        };
        self.elapsed = 0.0;
        Some(fps)
    }
}

/// 帧生成控制器
#[derive(Debug)]
pub struct FrameGenerationController {
    lifecycle: Lifecycle,
    target_fps: i32,
    monitor: FrameMonitor,
}

impl FrameGenerationController {
    pub fn new(target_fps: i32) -> Self {
        Self {
            lifecycle: Lifecycle::new(FeatureKind::FrameGeneration),
            target_fps: clamp_target_fps(target_fps),
            monitor: FrameMonitor::default(),
        }
    }

    pub fn target_fps(&self) -> i32 {
        self.target_fps
    }

    pub fn is_enabled(&self) -> bool {
        self.lifecycle.is_enabled()
    }

    pub fn enable(&mut self, ctx: &mut RenderContext<'_>) -> FeatureResult<()> {
        self.lifecycle.check_enable()?;
        self.apply_frame_pacing(ctx);
        self.monitor = FrameMonitor::default();
        self.lifecycle.mark_enabled();
        tracing::info!(
            target: "frame_generation",
            "Frame generation enabled, target {} FPS",
            self.target_fps
        );
        Ok(())
    }

    /// 修改目标帧率，返回钳制后的值
    pub fn set_target_frame_rate(
        &mut self,
        ctx: &mut RenderContext<'_>,
        fps: i32,
    ) -> FeatureResult<i32> {
        self.lifecycle.check_configure("set target frame rate")?;
        let clamped = clamp_target_fps(fps);
        if clamped != fps {
            tracing::warn!(
                target: "frame_generation",
                "Target frame rate {} clamped to {}",
                fps,
                clamped
            );
        }
        self.target_fps = clamped;
        ctx.set(FeatureKind::FrameGeneration, RenderParam::TargetFrameRate, clamped);
        Ok(clamped)
    }

    fn apply_frame_pacing(&self, ctx: &mut RenderContext<'_>) {
        let owner = FeatureKind::FrameGeneration;
        ctx.set(owner, RenderParam::TargetFrameRate, self.target_fps);
        ctx.set(owner, RenderParam::FixedTimestep, FRAME_GENERATION_TIMESTEP);
        ctx.set(owner, RenderParam::VSyncCount, 0i32);
    }

    /// 每帧帧率监控，返回本次是否输出了日志
    pub fn on_frame(&mut self, delta_seconds: f32) -> bool {
        if !self.lifecycle.is_enabled() {
            return false;
        }
        match self.monitor.tick(delta_seconds) {
            Some(fps) => {
                tracing::info!(
                    target: "frame_generation",
                    "Average {:.1} FPS over {} frames (target {})",
                    fps,
                    FPS_LOG_INTERVAL,
                    self.target_fps
                );
                true
            }
            None => false,
        }
    }
}

impl FeatureController for FrameGenerationController {
    fn kind(&self) -> FeatureKind {
        FeatureKind::FrameGeneration
    }

    fn state(&self) -> FeatureState {
        self.lifecycle.state()
    }

    fn attach(&mut self, caps: &DeviceCapabilities) -> FeatureState {
        self.lifecycle.attach(&caps.device_name, caps.has_frame_gen_hw)
    }

    fn disable(&mut self, ctx: &mut RenderContext<'_>) {
        if !self.lifecycle.mark_disabled() {
            return;
        }
        // 写回启用前宿主的值；宿主默认即不限帧率与 DEFAULT_FIXED_TIMESTEP
        ctx.restore(FeatureKind::FrameGeneration);
        tracing::info!(target: "frame_generation", "Frame generation disabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::FeatureError;
    use crate::core::Diagnostics;
    use crate::host::{
        HostEngine, ParamValue, SimulatedHost, DEFAULT_FIXED_TIMESTEP, UNBOUNDED_FRAME_RATE,
    };
    use crate::ledger::SettingsLedger;
    use fidelity_engine_hardware::probe;

    const RTX_4090: &str = "NVIDIA GeForce RTX 4090";

    #[test]
    fn test_target_clamped_on_construction() {
        assert_eq!(FrameGenerationController::new(30).target_fps(), 60);
        assert_eq!(FrameGenerationController::new(500).target_fps(), 240);
        assert_eq!(FrameGenerationController::new(144).target_fps(), 144);
    }

    #[test]
    fn test_enable_and_disable_restore_pacing() {
        let mut host = SimulatedHost::new(RTX_4090);
        let mut ledger = SettingsLedger::new();
        let mut diagnostics = Diagnostics::new();

        let mut controller = FrameGenerationController::new(DEFAULT_TARGET_FPS);
        assert_eq!(controller.attach(&probe(RTX_4090)), FeatureState::Supported);

        controller
            .enable(&mut RenderContext::new(&mut host, &mut ledger, &mut diagnostics))
            .unwrap();
        assert_eq!(host.global(RenderParam::VSyncCount), ParamValue::Int(0));
        assert_eq!(host.global(RenderParam::TargetFrameRate), ParamValue::Int(120));
        assert_eq!(
            host.global(RenderParam::FixedTimestep),
            ParamValue::Float(FRAME_GENERATION_TIMESTEP)
        );

        controller.disable(&mut RenderContext::new(&mut host, &mut ledger, &mut diagnostics));
        assert_eq!(host.global(RenderParam::VSyncCount), ParamValue::Int(1));
        assert_eq!(host.global(RenderParam::TargetFrameRate), ParamValue::Int(UNBOUNDED_FRAME_RATE));
        assert_eq!(
            host.global(RenderParam::FixedTimestep),
            ParamValue::Float(DEFAULT_FIXED_TIMESTEP)
        );
    }

    #[test]
    fn test_disable_returns_host_pacing_not_defaults() {
        let mut host = SimulatedHost::new(RTX_4090);
        host.write(RenderParam::TargetFrameRate.into(), ParamValue::Int(90)).unwrap();
        host.write(RenderParam::FixedTimestep.into(), ParamValue::Float(0.01)).unwrap();
        let mut ledger = SettingsLedger::new();
        let mut diagnostics = Diagnostics::new();

        let mut controller = FrameGenerationController::new(DEFAULT_TARGET_FPS);
        controller.attach(&probe(RTX_4090));
        controller
            .enable(&mut RenderContext::new(&mut host, &mut ledger, &mut diagnostics))
            .unwrap();
        assert_eq!(host.global(RenderParam::TargetFrameRate), ParamValue::Int(120));

        controller.disable(&mut RenderContext::new(&mut host, &mut ledger, &mut diagnostics));
        assert_eq!(host.global(RenderParam::TargetFrameRate), ParamValue::Int(90));
        assert_eq!(host.global(RenderParam::FixedTimestep), ParamValue::Float(0.01));
        assert_eq!(host.global(RenderParam::VSyncCount), ParamValue::Int(1));
    }

    #[test]
    fn test_set_target_frame_rate() {
        let mut host = SimulatedHost::new(RTX_4090);
        let mut ledger = SettingsLedger::new();
        let mut diagnostics = Diagnostics::new();
        let mut ctx = RenderContext::new(&mut host, &mut ledger, &mut diagnostics);

        let mut controller = FrameGenerationController::new(DEFAULT_TARGET_FPS);
        controller.attach(&probe(RTX_4090));
        assert!(matches!(
            controller.set_target_frame_rate(&mut ctx, 144),
            Err(FeatureError::PreconditionNotMet { .. })
        ));

        controller.enable(&mut ctx).unwrap();
        assert_eq!(controller.set_target_frame_rate(&mut ctx, 1000).unwrap(), 240);
        assert_eq!(host.global(RenderParam::TargetFrameRate), ParamValue::Int(240));
    }

    #[test]
    fn test_rtx_30_is_unsupported() {
        let mut controller = FrameGenerationController::new(DEFAULT_TARGET_FPS);
        assert_eq!(
            controller.attach(&probe("NVIDIA GeForce RTX 3080")),
            FeatureState::Unsupported
        );
    }

    #[test]
    fn test_monitor_logs_every_interval() {
        let mut host = SimulatedHost::new(RTX_4090);
        let mut ledger = SettingsLedger::new();
        let mut diagnostics = Diagnostics::new();

        let mut controller = FrameGenerationController::new(DEFAULT_TARGET_FPS);
        assert!(!controller.on_frame(0.016));

        controller.attach(&probe(RTX_4090));
        controller
            .enable(&mut RenderContext::new(&mut host, &mut ledger, &mut diagnostics))
            .unwrap();

        let logged = (0..FPS_LOG_INTERVAL * 2)
            .filter(|_| controller.on_frame(1.0 / 120.0))
            .count();
        assert_eq!(logged, 2);
    }

    #[test]
    fn test_monitor_average() {
        let mut monitor = FrameMonitor::default();
        let mut result = None;
        for _ in 0..FPS_LOG_INTERVAL {
            result = monitor.tick(0.01);
        }
        let fps = result.unwrap();
        assert!((fps - 100.0).abs() < 0.5);
    }
}
