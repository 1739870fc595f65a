//! 诊断记录
//!
//! 功能层错误不会中断编排器，而是降级为警告日志并保留在有界的诊断记录中，
//! 供宿主集成层查询。

use super::error::FeatureError;
use std::collections::VecDeque;

/// 默认保留的诊断条目数
const DEFAULT_CAPACITY: usize = 64;

/// 有界诊断记录
#[derive(Debug, Clone)]
pub struct Diagnostics {
    entries: VecDeque<FeatureError>,
    capacity: usize,
    total: u64,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            total: 0,
        }
    }

    /// 记录一条可恢复错误并输出警告
    pub fn report(&mut self, error: FeatureError) {
        tracing::warn!(target: "enhancer", "{}", error);
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(error);
        self.total += 1;
    }

    /// 记录结果中的错误（若有）
    pub fn absorb<T>(&mut self, result: Result<T, FeatureError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.report(error);
                None
            }
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &FeatureError> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&FeatureError> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 累计报告次数（含已被挤出的条目）
    pub fn total_reported(&self) -> u64 {
        self.total
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}
