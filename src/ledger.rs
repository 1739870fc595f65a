//! 设置快照/恢复账本
//!
//! 每个控制器在修改宿主参数之前都通过账本记录修改前的值，拆除时再按插入的逆序恢复。
//!
//! 同一参数在账本中始终只有一个条目。多个控制器先后修改同一参数时，条目内部按记录
//! 顺序保存分层快照：第一层保存最早的原始值，后续每层保存该控制器写入前看到的值。
//! 无论以何种顺序恢复，最后一个持有者恢复后宿主上的值总是最早记录的原始值。

use crate::core::error::HostResult;
use crate::features::FeatureKind;
use crate::host::{HostEngine, ParamKey, ParamValue};
use serde::Serialize;
use std::collections::HashMap;

/// 单个持有者的快照层
#[derive(Debug, Clone, PartialEq, Serialize)]
struct Layer {
    owner: FeatureKind,
    /// 该持有者写入前的值
    prior: ParamValue,
    /// 全局记录序号，用于逆序恢复
    seq: u64,
}

/// 一个参数的账本条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    key: ParamKey,
    layers: Vec<Layer>,
}

impl LedgerEntry {
    pub fn key(&self) -> ParamKey {
        self.key
    }

    /// 最早记录的值
    pub fn original(&self) -> ParamValue {
        self.layers[0].prior
    }

    /// 当前持有者，按记录顺序
    pub fn owners(&self) -> impl Iterator<Item = FeatureKind> + '_ {
        self.layers.iter().map(|layer| layer.owner)
    }

    fn layer_of(&self, owner: FeatureKind) -> Option<usize> {
        self.layers.iter().position(|layer| layer.owner == owner)
    }
}

/// 设置账本
///
/// 条目按参数键索引，逐帧重复写入同一参数只做一次哈希查找。
#[derive(Debug, Default)]
pub struct SettingsLedger {
    entries: HashMap<ParamKey, LedgerEntry>,
    /// 每个持有者的快照层数
    layer_counts: HashMap<FeatureKind, usize>,
    next_seq: u64,
}

impl SettingsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录参数修改前的值
    ///
    /// 同一持有者重复记录同一参数时保留首次快照，返回 false。
    pub fn record(&mut self, key: ParamKey, current: ParamValue, owner: FeatureKind) -> bool {
        let seq = self.next_seq;
        let layer = Layer { owner, prior: current, seq };

        match self.entries.get_mut(&key) {
            Some(entry) => {
                if entry.layer_of(owner).is_some() {
                    return false;
                }
                tracing::debug!(
                    target: "ledger",
                    "{} layered over {:?} on {}",
                    owner,
                    entry.layers.last().map(|l| l.owner),
                    key
                );
                entry.layers.push(layer);
            }
            None => {
                self.entries.insert(key, LedgerEntry { key, layers: vec![layer] });
            }
        }

        *self.layer_counts.entry(owner).or_insert(0) += 1;
        self.next_seq += 1;
        true
    }

    /// 先记录再写入
    ///
    /// 读取当前值失败时不写入，错误原样返回。
    pub fn apply(
        &mut self,
        host: &mut dyn HostEngine,
        owner: FeatureKind,
        key: ParamKey,
        value: ParamValue,
    ) -> HostResult<()> {
        let current = host.read(key)?;
        self.record(key, current, owner);
        tracing::trace!(target: "ledger", "{} sets {} = {:?}", owner, key, value);
        host.write(key, value)
    }

    /// 恢复并移除 `owner` 持有的全部条目，按插入逆序
    ///
    /// 返回被移除的快照层数量。宿主上已不存在的参数只记录警告并跳过。
    pub fn restore(&mut self, host: &mut dyn HostEngine, owner: FeatureKind) -> usize {
        if !self.holds(owner) {
            return 0;
        }
        let mut held = self.held_by(owner);
        held.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, key) in &held {
            self.unwind(host, *key, owner);
        }

        if !held.is_empty() {
            tracing::info!(target: "ledger", "{} restored {} parameter(s)", owner, held.len());
        }
        held.len()
    }

    /// 关闭路径：按持有者最近一次记录的逆序全部恢复
    pub fn restore_all(&mut self, host: &mut dyn HostEngine) -> usize {
        let mut restored = 0;
        while let Some(owner) = self.latest_owner() {
            restored += self.restore(host, owner);
        }
        restored
    }

    fn latest_owner(&self) -> Option<FeatureKind> {
        self.entries
            .values()
            .flat_map(|entry| entry.layers.iter())
            .max_by_key(|layer| layer.seq)
            .map(|layer| layer.owner)
    }

    /// 移除某个持有者在一个条目中的快照层
    fn unwind(&mut self, host: &mut dyn HostEngine, key: ParamKey, owner: FeatureKind) {
        let Some(entry) = self.entries.get_mut(&key) else {
            return;
        };
        let Some(position) = entry.layer_of(owner) else {
            return;
        };

        let is_top = position + 1 == entry.layers.len();
        let removed = entry.layers.remove(position);

        if is_top {
            // 顶层持有者决定当前值，写回它之前的值
            if let Err(error) = host.write(key, removed.prior) {
                tracing::warn!(target: "ledger", "Skipping restore of {}: {}", key, error);
            }
        } else {
            // 上一层接管被移除层的快照，宿主当前值保持不变
            entry.layers[position].prior = removed.prior;
        }

        if entry.layers.is_empty() {
            self.entries.remove(&key);
        }
        if let Some(count) = self.layer_counts.get_mut(&owner) {
            *count -= 1;
            if *count == 0 {
                self.layer_counts.remove(&owner);
            }
        }
    }

    /// `owner` 的快照层：(记录序号, 参数)
    fn held_by(&self, owner: FeatureKind) -> Vec<(u64, ParamKey)> {
        self.entries
            .values()
            .filter_map(|entry| {
                entry
                    .layers
                    .iter()
                    .find(|layer| layer.owner == owner)
                    .map(|layer| (layer.seq, entry.key))
            })
            .collect()
    }

    /// `owner` 持有的参数，按记录顺序
    pub fn entries_for(&self, owner: FeatureKind) -> Vec<ParamKey> {
        let mut held = self.held_by(owner);
        held.sort_by_key(|(seq, _)| *seq);
        held.into_iter().map(|(_, key)| key).collect()
    }

    /// 参数对应的条目
    pub fn entry(&self, key: ParamKey) -> Option<&LedgerEntry> {
        self.entries.get(&key)
    }

    pub fn holds(&self, owner: FeatureKind) -> bool {
        self.layer_counts.contains_key(&owner)
    }

    /// 活跃条目数（每个参数至多一个）
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{LightKind, LightParam, RenderParam, ShadowResolution, SimulatedHost};

    const SHADOWS: ParamKey = ParamKey::Global(RenderParam::ShadowResolution);

    fn shadow(host: &SimulatedHost) -> ParamValue {
        host.global(RenderParam::ShadowResolution)
    }

    #[test]
    fn test_apply_and_restore() {
        let mut host = SimulatedHost::new("test");
        let mut ledger = SettingsLedger::new();

        ledger
            .apply(&mut host, FeatureKind::RayTracing, SHADOWS, ShadowResolution::VeryHigh.into())
            .unwrap();
        assert_eq!(shadow(&host), ParamValue::from(ShadowResolution::VeryHigh));
        assert_eq!(ledger.len(), 1);

        assert_eq!(ledger.restore(&mut host, FeatureKind::RayTracing), 1);
        assert_eq!(shadow(&host), ParamValue::from(ShadowResolution::High));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_repeat_record_keeps_first_snapshot() {
        let mut host = SimulatedHost::new("test");
        let mut ledger = SettingsLedger::new();

        ledger
            .apply(&mut host, FeatureKind::RayTracing, SHADOWS, ShadowResolution::VeryHigh.into())
            .unwrap();
        ledger
            .apply(&mut host, FeatureKind::RayTracing, SHADOWS, ShadowResolution::Low.into())
            .unwrap();

        ledger.restore(&mut host, FeatureKind::RayTracing);
        assert_eq!(shadow(&host), ParamValue::from(ShadowResolution::High));
    }

    #[test]
    fn test_layered_unwind_in_stack_order() {
        let mut host = SimulatedHost::new("test");
        let mut ledger = SettingsLedger::new();

        ledger
            .apply(&mut host, FeatureKind::RayTracing, SHADOWS, ShadowResolution::Medium.into())
            .unwrap();
        ledger
            .apply(&mut host, FeatureKind::PathTracing, SHADOWS, ShadowResolution::VeryHigh.into())
            .unwrap();
        assert_eq!(ledger.len(), 1);

        ledger.restore(&mut host, FeatureKind::PathTracing);
        assert_eq!(shadow(&host), ParamValue::from(ShadowResolution::Medium));

        ledger.restore(&mut host, FeatureKind::RayTracing);
        assert_eq!(shadow(&host), ParamValue::from(ShadowResolution::High));
    }

    #[test]
    fn test_layered_unwind_out_of_order() {
        let mut host = SimulatedHost::new("test");
        let mut ledger = SettingsLedger::new();

        ledger
            .apply(&mut host, FeatureKind::RayTracing, SHADOWS, ShadowResolution::Medium.into())
            .unwrap();
        ledger
            .apply(&mut host, FeatureKind::PathTracing, SHADOWS, ShadowResolution::VeryHigh.into())
            .unwrap();

        // 底层先恢复时，顶层的值继续生效
        ledger.restore(&mut host, FeatureKind::RayTracing);
        assert_eq!(shadow(&host), ParamValue::from(ShadowResolution::VeryHigh));
        assert_eq!(ledger.entry(SHADOWS).unwrap().original(), ParamValue::from(ShadowResolution::High));

        ledger.restore(&mut host, FeatureKind::PathTracing);
        assert_eq!(shadow(&host), ParamValue::from(ShadowResolution::High));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_restore_reverse_insertion_order() {
        let mut host = SimulatedHost::new("test");
        let mut ledger = SettingsLedger::new();
        let cascades = ParamKey::Global(RenderParam::ShadowCascades);
        let distance = ParamKey::Global(RenderParam::ShadowDistance);

        ledger.apply(&mut host, FeatureKind::RayTracing, cascades, 4i32.into()).unwrap();
        ledger.apply(&mut host, FeatureKind::RayTracing, distance, 150.0f32.into()).unwrap();
        assert_eq!(ledger.entries_for(FeatureKind::RayTracing), vec![cascades, distance]);

        ledger.restore(&mut host, FeatureKind::RayTracing);
        assert_eq!(host.global(RenderParam::ShadowCascades), ParamValue::Int(2));
        assert_eq!(host.global(RenderParam::ShadowDistance), ParamValue::Float(100.0));
    }

    #[test]
    fn test_restore_skips_missing_parameters() {
        let mut host = SimulatedHost::new("test");
        let mut ledger = SettingsLedger::new();
        let light = host.add_light(LightKind::Point);
        let bounce = ParamKey::Light(light, LightParam::BounceIntensity);

        ledger.apply(&mut host, FeatureKind::PathTracing, bounce, 2.0f32.into()).unwrap();
        ledger.apply(&mut host, FeatureKind::PathTracing, SHADOWS, ShadowResolution::VeryHigh.into()).unwrap();
        host.remove_light(light);

        assert_eq!(ledger.restore(&mut host, FeatureKind::PathTracing), 2);
        assert!(ledger.is_empty());
        assert_eq!(shadow(&host), ParamValue::from(ShadowResolution::High));
    }

    #[test]
    fn test_restore_all() {
        let mut host = SimulatedHost::new("test");
        let before = host.snapshot();
        let mut ledger = SettingsLedger::new();

        ledger.apply(&mut host, FeatureKind::Texture, ParamKey::Global(RenderParam::TextureLimit), 1i32.into()).unwrap();
        ledger.apply(&mut host, FeatureKind::RayTracing, SHADOWS, ShadowResolution::VeryHigh.into()).unwrap();
        ledger.apply(&mut host, FeatureKind::PathTracing, SHADOWS, ShadowResolution::Low.into()).unwrap();

        assert_eq!(ledger.restore_all(&mut host), 3);
        assert!(ledger.is_empty());
        assert_eq!(host.snapshot(), before);
    }

    #[test]
    fn test_apply_missing_parameter_records_nothing() {
        let mut host = SimulatedHost::new("test");
        let mut ledger = SettingsLedger::new();
        let light = host.add_light(LightKind::Spot);
        host.remove_light(light);

        let result = ledger.apply(
            &mut host,
            FeatureKind::RayTracing,
            ParamKey::Light(light, LightParam::Shadows),
            crate::host::LightShadows::Soft.into(),
        );
        assert!(result.is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_holds_tracks_layer_counts() {
        let mut host = SimulatedHost::new("test");
        let mut ledger = SettingsLedger::new();
        let cascades = ParamKey::Global(RenderParam::ShadowCascades);

        ledger.apply(&mut host, FeatureKind::RayTracing, SHADOWS, ShadowResolution::Low.into()).unwrap();
        ledger.apply(&mut host, FeatureKind::PathTracing, SHADOWS, ShadowResolution::VeryHigh.into()).unwrap();
        ledger.apply(&mut host, FeatureKind::PathTracing, cascades, 4i32.into()).unwrap();
        // 重复记录不增加层数
        ledger.apply(&mut host, FeatureKind::PathTracing, cascades, 2i32.into()).unwrap();
        assert!(ledger.holds(FeatureKind::PathTracing));

        ledger.restore(&mut host, FeatureKind::RayTracing);
        assert!(!ledger.holds(FeatureKind::RayTracing));
        assert!(ledger.holds(FeatureKind::PathTracing));
        assert_eq!(ledger.restore(&mut host, FeatureKind::Texture), 0);

        assert_eq!(ledger.restore(&mut host, FeatureKind::PathTracing), 2);
        assert!(!ledger.holds(FeatureKind::PathTracing));
        assert!(ledger.is_empty());
    }
}
