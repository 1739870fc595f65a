//! 核心宏定义

/// 为纯数据结构实现 Default trait
///
/// 使用示例:
/// ```rust
/// use fidelity_engine::impl_default;
///
/// struct FrameBudget {
///     target_fps: u32,
///     label: String,
/// }
///
/// impl_default!(FrameBudget {
///     target_fps: 120,
///     label: String::new(),
/// });
///
/// assert_eq!(FrameBudget::default().target_fps, 120);
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}
