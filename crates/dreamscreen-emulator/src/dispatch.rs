//! Flag-class classification
//!
//! A packet is tested against every class independently. One packet can
//! match several classes (e.g. `RESPONSE | WRITE_CONSTANT`) and then runs
//! through each matching command table in order.

use dreamscreen_core::PacketFlags;
use std::ops::BitOr;

/// Pragmatic role of a packet, derived from its flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagClass {
    /// `RESPONSE` or `BROADCAST`
    ResponseOrBroadcast,
    /// `RESPONSE_REQUEST`
    ResponseRequested,
    /// `WRITE_CONSTANT`
    WriteConstant,
}

impl FlagClass {
    pub fn mask(self) -> PacketFlags {
        match self {
            FlagClass::ResponseOrBroadcast => PacketFlags::RESPONSE | PacketFlags::BROADCAST,
            FlagClass::ResponseRequested => PacketFlags::RESPONSE_REQUEST,
            FlagClass::WriteConstant => PacketFlags::WRITE_CONSTANT,
        }
    }

    pub fn matches(self, flags: PacketFlags) -> bool {
        flags.intersects(self.mask())
    }
}

/// Result of routing a packet through one or more classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    Handled,
    #[default]
    Unhandled,
}

impl Outcome {
    pub fn is_handled(self) -> bool {
        self == Outcome::Handled
    }
}

impl BitOr for Outcome {
    type Output = Outcome;

    fn bitor(self, rhs: Outcome) -> Outcome {
        if self.is_handled() || rhs.is_handled() {
            Outcome::Handled
        } else {
            Outcome::Unhandled
        }
    }
}

/// In/out token the caller threads through dispatch
///
/// Outcomes are OR-ed in, so a class that does not know the command never
/// clears a handled mark left by an earlier class or by the caller.
#[derive(Debug, Clone, Default)]
pub struct HandleState {
    outcome: Outcome,
    handled_by: Vec<FlagClass>,
}

impl HandleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, class: FlagClass, outcome: Outcome) {
        if outcome.is_handled() {
            self.handled_by.push(class);
        }
        self.outcome = self.outcome | outcome;
    }

    /// Mark handled outside any class (e.g. by a wrapping device layer)
    pub fn set_handled(&mut self) {
        self.outcome = Outcome::Handled;
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_handled(&self) -> bool {
        self.outcome.is_handled()
    }

    /// Classes that consumed the packet, in evaluation order
    pub fn handled_by(&self) -> &[FlagClass] {
        &self.handled_by
    }
}
