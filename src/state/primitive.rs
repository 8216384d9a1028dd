//! Environment-level primitives - exactly one is submitted per tick

use std::fmt;

use crate::infra::Position;

/// Identifier of an environment function (the game's action id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u16);

impl FunctionId {
    pub const NO_OP: FunctionId = FunctionId(0);
    pub const SELECT_POINT: FunctionId = FunctionId(2);
    pub const SELECT_ARMY: FunctionId = FunctionId(7);
    pub const ATTACK_MINIMAP: FunctionId = FunctionId(13);
    pub const HARVEST_GATHER_SCREEN: FunctionId = FunctionId(264);
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a `select_point` call modifies the current selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    Select,
    Toggle,
    SelectAllOfType,
}

impl SelectMode {
    fn argument(self) -> i32 {
        match self {
            SelectMode::Select => 0,
            SelectMode::Toggle => 1,
            SelectMode::SelectAllOfType => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Primitive {
    NoOp,
    SelectPoint {
        mode: SelectMode,
        target: Position,
    },
    SelectArmy {
        queued: bool,
    },
    AttackMinimap {
        queued: bool,
        target: Position,
    },
    Build {
        function: FunctionId,
        queued: bool,
        target: Position,
    },
    Train {
        function: FunctionId,
        queued: bool,
    },
    HarvestGather {
        queued: bool,
        target: Position,
    },
}

impl Primitive {
    pub fn function_id(&self) -> FunctionId {
        match self {
            Primitive::NoOp => FunctionId::NO_OP,
            Primitive::SelectPoint { .. } => FunctionId::SELECT_POINT,
            Primitive::SelectArmy { .. } => FunctionId::SELECT_ARMY,
            Primitive::AttackMinimap { .. } => FunctionId::ATTACK_MINIMAP,
            Primitive::Build { function, .. } | Primitive::Train { function, .. } => *function,
            Primitive::HarvestGather { .. } => FunctionId::HARVEST_GATHER_SCREEN,
        }
    }

    /// Argument list in the environment's wire order
    pub fn arguments(&self) -> Vec<Vec<i32>> {
        match *self {
            Primitive::NoOp => Vec::new(),
            Primitive::SelectPoint { mode, target } => {
                vec![vec![mode.argument()], point(target)]
            }
            Primitive::SelectArmy { queued } | Primitive::Train { queued, .. } => {
                vec![queue_flag(queued)]
            }
            Primitive::AttackMinimap { queued, target }
            | Primitive::Build { queued, target, .. }
            | Primitive::HarvestGather { queued, target } => {
                vec![queue_flag(queued), point(target)]
            }
        }
    }

    pub fn is_no_op(&self) -> bool {
        matches!(self, Primitive::NoOp)
    }

    /// Screen or minimap coordinate this primitive points at, if any
    pub fn target(&self) -> Option<Position> {
        match *self {
            Primitive::SelectPoint { target, .. }
            | Primitive::AttackMinimap { target, .. }
            | Primitive::Build { target, .. }
            | Primitive::HarvestGather { target, .. } => Some(target),
            Primitive::NoOp | Primitive::SelectArmy { .. } | Primitive::Train { .. } => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Primitive::NoOp => "no_op",
            Primitive::SelectPoint { .. } => "select_point",
            Primitive::SelectArmy { .. } => "select_army",
            Primitive::AttackMinimap { .. } => "attack_minimap",
            Primitive::Build { .. } => "build_screen",
            Primitive::Train { .. } => "train_quick",
            Primitive::HarvestGather { .. } => "harvest_gather_screen",
        };
        write!(f, "{}{}{:?}", name, self.function_id(), self.arguments())
    }
}

fn queue_flag(queued: bool) -> Vec<i32> {
    vec![if queued { 1 } else { 0 }]
}

fn point(target: Position) -> Vec<i32> {
    vec![target.x, target.y]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_op_has_no_arguments() {
        assert_eq!(Primitive::NoOp.function_id(), FunctionId::NO_OP);
        assert!(Primitive::NoOp.arguments().is_empty());
        assert!(Primitive::NoOp.is_no_op());
    }

    #[test]
    fn test_select_all_arguments() {
        let primitive = Primitive::SelectPoint {
            mode: SelectMode::SelectAllOfType,
            target: Position::new(12, 30),
        };
        assert_eq!(primitive.function_id(), FunctionId::SELECT_POINT);
        assert_eq!(primitive.arguments(), vec![vec![2], vec![12, 30]]);
    }

    #[test]
    fn test_train_uses_descriptor_function() {
        let primitive = Primitive::Train {
            function: FunctionId(477),
            queued: true,
        };
        assert_eq!(primitive.function_id(), FunctionId(477));
        assert_eq!(primitive.arguments(), vec![vec![1]]);
        assert_eq!(primitive.target(), None);
    }

    #[test]
    fn test_attack_arguments() {
        let primitive = Primitive::AttackMinimap {
            queued: false,
            target: Position::new(47, 15),
        };
        assert_eq!(primitive.arguments(), vec![vec![0], vec![47, 15]]);
        assert_eq!(primitive.to_string(), "attack_minimap#13[[0], [47, 15]]");
    }
}
