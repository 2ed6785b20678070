//! Remote ASCII command vocabulary.
//!
//! One command per line, newline or carriage-return terminated,
//! case-sensitive. Anything unrecognized or malformed parses to `None`
//! and degrades to a silent no-op upstream.

use winch_traits::Direction;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// `JL` / `JR`: assert remote jog demand (mutually exclusive).
    Jog(Direction),
    /// `JS`: clear remote jog demand.
    JogStop,
    /// `GH` / `GW`: move to a saved setpoint; no-op when unsaved.
    GoHome,
    GoWell,
    /// `SH` / `SW`: save the current position.
    SaveHome,
    SaveWell,
    /// `ST`: clear remote jog; an active move decelerates to a stop in place.
    Stop,
    /// `ZP`: re-zero the dead-reckoned position (accepted only while idle).
    ZeroPosition,
    /// `GT<steps>`: move to an absolute step position.
    GoTo(i64),
    /// `MR<steps>`: move relative to the current position.
    MoveRelative(i64),
    /// `VJ<rps>` / `VM<rps>`: speed ceilings in rev/s; out-of-range ignored.
    SetJogSpeed(f32),
    SetMoveSpeed(f32),
    /// `?`: status query, answered by the host shell.
    Query,
}

impl Command {
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim_matches(['\r', '\n', ' ', '\t']);
        match line {
            "JL" => return Some(Command::Jog(Direction::ToHome)),
            "JR" => return Some(Command::Jog(Direction::ToWell)),
            "JS" => return Some(Command::JogStop),
            "GH" => return Some(Command::GoHome),
            "GW" => return Some(Command::GoWell),
            "SH" => return Some(Command::SaveHome),
            "SW" => return Some(Command::SaveWell),
            "ST" => return Some(Command::Stop),
            "ZP" => return Some(Command::ZeroPosition),
            "?" => return Some(Command::Query),
            _ => {}
        }
        if let Some(arg) = line.strip_prefix("GT") {
            return arg.parse::<i64>().ok().map(Command::GoTo);
        }
        if let Some(arg) = line.strip_prefix("MR") {
            return arg.parse::<i64>().ok().map(Command::MoveRelative);
        }
        if let Some(arg) = line.strip_prefix("VJ") {
            return parse_speed(arg).map(Command::SetJogSpeed);
        }
        if let Some(arg) = line.strip_prefix("VM") {
            return parse_speed(arg).map(Command::SetMoveSpeed);
        }
        None
    }
}

fn parse_speed(arg: &str) -> Option<f32> {
    let v = arg.parse::<f32>().ok()?;
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_commands_parse() {
        assert_eq!(Command::parse("JL"), Some(Command::Jog(Direction::ToHome)));
        assert_eq!(Command::parse("JR"), Some(Command::Jog(Direction::ToWell)));
        assert_eq!(Command::parse("JS"), Some(Command::JogStop));
        assert_eq!(Command::parse("ST\r\n"), Some(Command::Stop));
        assert_eq!(Command::parse("?"), Some(Command::Query));
    }

    #[test]
    fn signed_step_arguments() {
        assert_eq!(Command::parse("GT5000"), Some(Command::GoTo(5000)));
        assert_eq!(Command::parse("GT-5000"), Some(Command::GoTo(-5000)));
        assert_eq!(Command::parse("MR+250"), Some(Command::MoveRelative(250)));
        assert_eq!(Command::parse("MR-1"), Some(Command::MoveRelative(-1)));
    }

    #[test]
    fn speed_arguments() {
        assert_eq!(Command::parse("VJ2.5"), Some(Command::SetJogSpeed(2.5)));
        assert_eq!(Command::parse("VM7.5"), Some(Command::SetMoveSpeed(7.5)));
        // non-finite is malformed, not out-of-range
        assert_eq!(Command::parse("VJNaN"), None);
        assert_eq!(Command::parse("VJinf"), None);
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("GT"), None);
        assert_eq!(Command::parse("GTabc"), None);
        assert_eq!(Command::parse("MR1.5"), None);
        assert_eq!(Command::parse("XX"), None);
        assert_eq!(Command::parse("jl"), None); // case-sensitive
        assert_eq!(Command::parse("GT 5000"), None); // no inner whitespace
    }
}
