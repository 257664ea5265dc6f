//! Task trait - 型付き task kind の定義
//!
//! # 学習ポイント
//! - Associated Constants (`const KIND`, `const LEAF`)
//! - Associated Type (`type Args: ArgLayout`) で引数レイアウトを kind に紐付ける

use super::codec::ArgLayout;
use crate::domain::{KindConstraints, ProcessorConstraint, TaskKindId};

/// Task は task kind と引数レイアウトを対応付ける
///
/// # 使用例
/// ```ignore
/// struct PrintKey;
///
/// impl Task for PrintKey {
///     const KIND: TaskKindId = TaskKindId::new(2);
///     const NAME: &'static str = "print key";
///     const LEAF: bool = true;
///     type Args = u8;
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    const KIND: TaskKindId;

    const NAME: &'static str;

    const LEAF: bool = false;

    const PROCESSOR: ProcessorConstraint = ProcessorConstraint::Any;

    /// Whether launchers of this kind want the returned value.
    const RETURNS_VALUE: bool = false;

    type Args: ArgLayout;

    fn constraints() -> KindConstraints {
        let constraints = KindConstraints::new(Self::Args::SIZE).processor(Self::PROCESSOR);
        if Self::LEAF {
            constraints.leaf()
        } else {
            constraints
        }
    }
}
