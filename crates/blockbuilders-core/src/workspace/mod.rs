pub mod model;

pub use model::{
    BlockKind, CalloutAction, OnboardingCallout, Position, StrategyBlock, StrategyEdge,
    StrategySeed,
};
