//! Status line rendering.

use crate::controller::Mode;
use std::fmt;

/// One self-contained status report, rendered as the single ASCII line the
/// remote protocol expects:
///
/// `POS:<steps> MODE:<IDLE|JOG|MOVE> SPD:<rps> HOME:<Y@steps|N>
/// WELL:<Y@steps|N> ESTOP:<0|1> VJOG:<rps> VMOVE:<rps>`
#[derive(Debug, Clone, Copy)]
pub struct StatusSnapshot {
    pub position: i64,
    pub mode: Mode,
    pub speed_rps: f32,
    pub home: Option<i64>,
    pub well: Option<i64>,
    pub estop: bool,
    pub jog_rps: f32,
    pub move_rps: f32,
}

struct Slot(Option<i64>);

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(steps) => write!(f, "Y@{steps}"),
            None => f.write_str("N"),
        }
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            Mode::Idle => "IDLE",
            Mode::Jog => "JOG",
            Mode::Move => "MOVE",
        };
        write!(
            f,
            "POS:{} MODE:{} SPD:{:.2} HOME:{} WELL:{} ESTOP:{} VJOG:{:.2} VMOVE:{:.2}",
            self.position,
            mode,
            self.speed_rps,
            Slot(self.home),
            Slot(self.well),
            u8::from(self.estop),
            self.jog_rps,
            self.move_rps,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_the_full_line() {
        let s = StatusSnapshot {
            position: -120,
            mode: Mode::Move,
            speed_rps: 2.5,
            home: Some(0),
            well: None,
            estop: false,
            jog_rps: 10.0,
            move_rps: 7.5,
        };
        assert_eq!(
            s.to_string(),
            "POS:-120 MODE:MOVE SPD:2.50 HOME:Y@0 WELL:N ESTOP:0 VJOG:10.00 VMOVE:7.50"
        );
    }

    #[test]
    fn estop_renders_as_one() {
        let s = StatusSnapshot {
            position: 0,
            mode: Mode::Idle,
            speed_rps: 0.0,
            home: None,
            well: None,
            estop: true,
            jog_rps: 10.0,
            move_rps: 7.5,
        };
        assert!(s.to_string().contains("ESTOP:1"));
    }
}
