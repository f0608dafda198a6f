//! Human-friendly command builders
//!
//! Each helper translates a semantic request ("set the bed temperature",
//! "home these axes") into a [`Command`] carrying the Marlin opcode and
//! parameter list. Helpers are pure: nothing here touches the line-number
//! state, which belongs to the streaming engine.

use crate::error::{Error, GcodeError, Result};
use crate::gcode::command::{Command, ParamValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opcode that sets the firmware's current line number.
pub const LINE_NUMBER_OPCODE: &str = "M110";

/// Extrusion mode, mapped to `M82`/`M83`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtrusionMode {
    /// Absolute extrusion distances (`M82`).
    Absolute,
    /// Relative extrusion distances (`M83`).
    Relative,
}

impl ExtrusionMode {
    /// The opcode selecting this mode.
    pub fn opcode(&self) -> &'static str {
        match self {
            ExtrusionMode::Absolute => "M82",
            ExtrusionMode::Relative => "M83",
        }
    }
}

impl fmt::Display for ExtrusionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtrusionMode::Absolute => write!(f, "absolute"),
            ExtrusionMode::Relative => write!(f, "relative"),
        }
    }
}

impl FromStr for ExtrusionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "absolute" => Ok(ExtrusionMode::Absolute),
            "relative" => Ok(ExtrusionMode::Relative),
            other => Err(GcodeError::InvalidSyntax {
                reason: format!("unknown extrusion mode '{}'", other),
            }
            .into()),
        }
    }
}

/// Measurement units, mapped to `G21`/`G20`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Millimeters (`G21`).
    Millimeters,
    /// Inches (`G20`).
    Inches,
}

impl Units {
    /// The opcode selecting these units.
    pub fn opcode(&self) -> &'static str {
        match self {
            Units::Millimeters => "G21",
            Units::Inches => "G20",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Units::Millimeters => write!(f, "mm"),
            Units::Inches => write!(f, "in"),
        }
    }
}

impl FromStr for Units {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mm" | "millimeter" | "millimeters" => Ok(Units::Millimeters),
            "in" | "inch" | "inches" => Ok(Units::Inches),
            other => Err(GcodeError::InvalidSyntax {
                reason: format!("unknown unit '{}'", other),
            }
            .into()),
        }
    }
}

/// Positioning mode, mapped to `G90`/`G91`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Positioning {
    /// Absolute coordinates (`G90`).
    Absolute,
    /// Relative coordinates (`G91`).
    Relative,
}

impl Positioning {
    /// The opcode selecting this mode.
    pub fn opcode(&self) -> &'static str {
        match self {
            Positioning::Absolute => "G90",
            Positioning::Relative => "G91",
        }
    }
}

impl fmt::Display for Positioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Positioning::Absolute => write!(f, "absolute"),
            Positioning::Relative => write!(f, "relative"),
        }
    }
}

impl FromStr for Positioning {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "absolute" => Ok(Positioning::Absolute),
            "relative" => Ok(Positioning::Relative),
            other => Err(GcodeError::InvalidSyntax {
                reason: format!("unknown positioning mode '{}'", other),
            }
            .into()),
        }
    }
}

/// Arguments for a head move. Coordinates in current units, feed rate in
/// units per second, filament length in units of filament.
#[derive(Debug, Clone, Copy, Default)]
pub struct Travel {
    /// Target X coordinate.
    pub x: Option<f64>,
    /// Target Y coordinate.
    pub y: Option<f64>,
    /// Target Z coordinate.
    pub z: Option<f64>,
    /// Feed rate in units/second; emitted as units/minute.
    pub feed_rate: Option<f64>,
    /// Filament length to feed during the move.
    pub filament: Option<f64>,
    /// Force an extruding move even without filament.
    pub extruding: bool,
}

/// `T<n>`: select the default print head / tool index.
pub fn set_toolidx(toolidx: u32) -> Command {
    Command::new(format!("T{}", toolidx))
}

/// `M110`: set the current line number.
///
/// The built command pre-assigns itself `number - 1`: because it sets the
/// line number, it behaves as though it came from the line before the one
/// it names. Line numbers start at 1.
pub fn set_lineno(number: u32) -> Result<Command> {
    if number < 1 {
        return Err(GcodeError::LineNumberOutOfRange { number }.into());
    }
    Ok(Command::new(LINE_NUMBER_OPCODE)
        .arg('N', number)?
        .with_comment("set line no")
        .with_line_no(number - 1))
}

/// `M104`: set the temperature of a hot end, and optionally the max
/// autotemp limit for it.
pub fn set_hotendtemp(celsius: f64, toolidx: Option<u32>, max_autotemp: Option<f64>) -> Result<Command> {
    let mut cmd = Command::new("M104")
        .arg('S', celsius)?
        .arg_opt('T', toolidx)?;
    if let Some(limit) = max_autotemp {
        cmd = cmd.arg('B', limit)?.arg('F', ParamValue::Flag)?;
    }
    Ok(cmd.with_comment("set hotend temp"))
}

/// `M105`: request a temperatures report.
pub fn get_temp(toolidx: Option<u32>) -> Result<Command> {
    Ok(Command::new("M105")
        .arg_opt('T', toolidx)?
        .with_comment("report temps"))
}

/// `M109`: wait for a hot end to reach a temperature.
///
/// With `heat_to` the firmware only waits while heating (`R`); otherwise it
/// waits for the temperature from either direction (`S`).
pub fn wait_hotendtemp(
    celsius: f64,
    toolidx: Option<u32>,
    heat_to: bool,
    max_autotemp: Option<f64>,
) -> Result<Command> {
    let (s, r) = if heat_to {
        (None, Some(celsius))
    } else {
        (Some(celsius), None)
    };
    let mut cmd = Command::new("M109")
        .arg_opt('S', s)?
        .arg_opt('R', r)?
        .arg_opt('T', toolidx)?;
    if let Some(limit) = max_autotemp {
        cmd = cmd.arg('B', limit)?.arg('F', ParamValue::Flag)?;
    }
    Ok(cmd.with_comment("wait on hotend temp"))
}

/// `M190`: wait for the bed to reach a temperature.
pub fn wait_bedtemp(celsius: f64, heat_to: bool) -> Result<Command> {
    let (s, r) = if heat_to {
        (None, Some(celsius))
    } else {
        (Some(celsius), None)
    };
    Ok(Command::new("M190")
        .arg_opt('S', s)?
        .arg_opt('R', r)?
        .with_comment("wait for bed temp"))
}

/// `M140`: set the bed temperature.
pub fn set_bedtemp(celsius: f64) -> Result<Command> {
    Ok(Command::new("M140")
        .arg('S', celsius)?
        .with_comment("set bed temp"))
}

/// `M82`/`M83`: set the extrusion mode.
pub fn set_extrudemode(mode: ExtrusionMode) -> Command {
    Command::new(mode.opcode()).with_comment(format!("set {} e-mode", mode))
}

/// `G21`/`G20`: switch measurement units.
pub fn set_units(units: Units) -> Command {
    Command::new(units.opcode()).with_comment(format!("set units to {}", units))
}

/// `G90`/`G91`: switch positioning mode.
pub fn set_positioning(mode: Positioning) -> Command {
    Command::new(mode.opcode()).with_comment(format!("set {} positioning", mode))
}

/// `M106`: set a fan speed (0-255).
pub fn set_fanspeed(speed: i32, fanidx: Option<u32>, secondary: Option<u32>) -> Result<Command> {
    Command::new("M106")
        .arg_opt('P', fanidx)?
        .arg('S', speed)?
        .arg_opt('T', secondary)
}

/// `M107`: turn a fan off.
pub fn set_fanoff(fanidx: Option<u32>) -> Result<Command> {
    Command::new("M107").arg_opt('P', fanidx)
}

/// `G28`: home one or more axes. All-false homes everything.
pub fn home_axis(x: bool, y: bool, z: bool, optional: bool) -> Result<Command> {
    Command::new("G28")
        .flag('X', x)?
        .flag('Y', y)?
        .flag('Z', z)?
        .flag('O', optional)
}

/// `G28` with no axis arguments: home everything, explicitly.
pub fn home_all_axis() -> Result<Command> {
    home_axis(false, false, false, false)
}

/// `G92`: set the steps-per-unit for one or more axes.
pub fn set_axis_steps(
    steps: Option<f64>,
    extruderidx: Option<u32>,
    x_units: Option<f64>,
    y_units: Option<f64>,
    z_units: Option<f64>,
) -> Result<Command> {
    Command::new("G92")
        .arg_opt('E', steps)?
        .arg_opt('T', extruderidx)?
        .arg_opt('X', x_units)?
        .arg_opt('Y', y_units)?
        .arg_opt('Z', z_units)
}

/// `G92 E0`: clear the extruded-length counter.
pub fn zero_extruded_length() -> Result<Command> {
    set_axis_steps(Some(0.0), None, None, None, None)
}

/// `G0`/`G1`: move the active print head.
///
/// Feeding filament (or forcing `extruding`) selects `G1`; a plain travel
/// move is `G0`. At least one argument is required.
pub fn travel(args: Travel) -> Result<Command> {
    if args.x.is_none()
        && args.y.is_none()
        && args.z.is_none()
        && args.feed_rate.is_none()
        && args.filament.is_none()
    {
        return Err(GcodeError::EmptyMove.into());
    }
    let extruding = args.extruding || args.filament.is_some();
    Command::new(if extruding { "G1" } else { "G0" })
        .arg_opt('X', args.x)?
        .arg_opt('Y', args.y)?
        .arg_opt('Z', args.z)?
        .arg_opt('F', args.feed_rate.map(|f| f * 60.0))?
        .arg_opt('E', args.filament)
}

/// Abbreviation for [`travel`] with `extruding` forced on.
pub fn extrude(args: Travel) -> Result<Command> {
    travel(Travel {
        extruding: true,
        ..args
    })
}

/// `M114`: query the current position. `detail` selects the short (`D<`) or
/// long (`D>`) report form.
pub fn get_position(detail: Option<bool>) -> Result<Command> {
    let marker = detail.map(|long| if long { ">" } else { "<" });
    Ok(Command::new("M114")
        .arg_opt('D', marker)?
        .with_comment("get position"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expect_gcode(
        got: &Command,
        opcode: &str,
        params: &[(char, ParamValue)],
        line_no: Option<u32>,
    ) {
        assert_eq!(got.opcode(), opcode);
        assert_eq!(got.line_no(), line_no);
        let got_params: Vec<(char, ParamValue)> =
            got.params().map(|(k, v)| (k, v.clone())).collect();
        assert_eq!(got_params, params);
    }

    #[test]
    fn test_set_lineno() {
        expect_gcode(
            &set_lineno(1).unwrap(),
            "M110",
            &[('N', ParamValue::Int(1))],
            Some(0),
        );
        expect_gcode(
            &set_lineno(33).unwrap(),
            "M110",
            &[('N', ParamValue::Int(33))],
            Some(32),
        );
        assert!(set_lineno(0).is_err());
    }

    #[test]
    fn test_set_toolidx() {
        expect_gcode(&set_toolidx(0), "T0", &[], None);
        expect_gcode(&set_toolidx(3), "T3", &[], None);
    }

    #[test]
    fn test_home_axis() {
        expect_gcode(&home_axis(false, false, false, false).unwrap(), "G28", &[], None);
        expect_gcode(
            &home_axis(true, true, false, false).unwrap(),
            "G28",
            &[('X', ParamValue::Flag), ('Y', ParamValue::Flag)],
            None,
        );
        expect_gcode(
            &home_axis(false, false, true, true).unwrap(),
            "G28",
            &[('Z', ParamValue::Flag), ('O', ParamValue::Flag)],
            None,
        );
        expect_gcode(&home_all_axis().unwrap(), "G28", &[], None);
    }

    #[test]
    fn test_travel() {
        expect_gcode(
            &travel(Travel {
                x: Some(1.0),
                y: Some(2.0),
                z: Some(5.0),
                ..Default::default()
            })
            .unwrap(),
            "G0",
            &[
                ('X', ParamValue::Float(1.0)),
                ('Y', ParamValue::Float(2.0)),
                ('Z', ParamValue::Float(5.0)),
            ],
            None,
        );
        expect_gcode(
            &travel(Travel {
                x: Some(2.0),
                feed_rate: Some(40.0),
                extruding: true,
                ..Default::default()
            })
            .unwrap(),
            "G1",
            &[('X', ParamValue::Float(2.0)), ('F', ParamValue::Float(2400.0))],
            None,
        );
        assert!(travel(Travel::default()).is_err());
    }

    #[test]
    fn test_filament_implies_extruding() {
        let cmd = travel(Travel {
            x: Some(10.0),
            filament: Some(2.5),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cmd.opcode(), "G1");
        assert_eq!(cmd.param('E'), Some(&ParamValue::Float(2.5)));

        let cmd = extrude(Travel {
            x: Some(10.0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cmd.opcode(), "G1");
    }

    #[test]
    fn test_set_modes() {
        expect_gcode(&set_extrudemode(ExtrusionMode::Absolute), "M82", &[], None);
        expect_gcode(&set_extrudemode(ExtrusionMode::Relative), "M83", &[], None);

        expect_gcode(&set_units(Units::Millimeters), "G21", &[], None);
        expect_gcode(&set_units(Units::Inches), "G20", &[], None);

        expect_gcode(&set_positioning(Positioning::Absolute), "G90", &[], None);
        expect_gcode(&set_positioning(Positioning::Relative), "G91", &[], None);
    }

    #[test]
    fn test_mode_spellings() {
        for spelling in ["mm", "millimeter", "millimeters"] {
            assert_eq!(spelling.parse::<Units>().unwrap(), Units::Millimeters);
        }
        for spelling in ["in", "inch", "inches"] {
            assert_eq!(spelling.parse::<Units>().unwrap(), Units::Inches);
        }
        assert!("furlongs".parse::<Units>().is_err());
        assert_eq!(
            "relative".parse::<ExtrusionMode>().unwrap(),
            ExtrusionMode::Relative
        );
        assert_eq!(
            "absolute".parse::<Positioning>().unwrap(),
            Positioning::Absolute
        );
    }

    #[test]
    fn test_temperatures() {
        expect_gcode(
            &set_bedtemp(75.0).unwrap(),
            "M140",
            &[('S', ParamValue::Float(75.0))],
            None,
        );
        expect_gcode(
            &wait_bedtemp(75.0, false).unwrap(),
            "M190",
            &[('S', ParamValue::Float(75.0))],
            None,
        );
        expect_gcode(
            &wait_bedtemp(75.0, true).unwrap(),
            "M190",
            &[('R', ParamValue::Float(75.0))],
            None,
        );
        expect_gcode(
            &set_hotendtemp(185.0, Some(1), None).unwrap(),
            "M104",
            &[('S', ParamValue::Float(185.0)), ('T', ParamValue::Int(1))],
            None,
        );
        expect_gcode(
            &set_hotendtemp(185.0, None, Some(200.0)).unwrap(),
            "M104",
            &[
                ('S', ParamValue::Float(185.0)),
                ('B', ParamValue::Float(200.0)),
                ('F', ParamValue::Flag),
            ],
            None,
        );
        expect_gcode(
            &wait_hotendtemp(185.0, None, true, None).unwrap(),
            "M109",
            &[('R', ParamValue::Float(185.0))],
            None,
        );
    }

    #[test]
    fn test_fans() {
        expect_gcode(
            &set_fanspeed(255, Some(1), None).unwrap(),
            "M106",
            &[('P', ParamValue::Int(1)), ('S', ParamValue::Int(255))],
            None,
        );
        expect_gcode(&set_fanoff(None).unwrap(), "M107", &[], None);
    }

    #[test]
    fn test_position_and_steps() {
        expect_gcode(
            &get_position(Some(false)).unwrap(),
            "M114",
            &[('D', ParamValue::Text("<".to_string()))],
            None,
        );
        expect_gcode(&get_position(None).unwrap(), "M114", &[], None);
        expect_gcode(
            &zero_extruded_length().unwrap(),
            "G92",
            &[('E', ParamValue::Float(0.0))],
            None,
        );
    }
}
