//! Replaying a recorded drawing session through the editor

use serde::{Deserialize, Serialize};

use super::{Click, FinishMode, Outline, Point, ShapeEditor};
use crate::error::{Error, Result};

/// One recorded editor interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DraftStep {
    Click { x: f64, y: f64 },
    Undo,
    GridSize { size: u32 },
    Snap { enabled: bool },
}

/// How the session ends when no click closed it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DraftFinish {
    #[default]
    Open,
    Closed,
    /// Building footprint close: too few points is an error
    Building,
}

/// Run `steps` through `editor` and produce the finished outline.
///
/// A click that closes the outline ends the session; any step after it is
/// rejected. Otherwise `finish` decides how the remaining points are
/// turned into an outline.
pub fn replay(
    editor: &mut ShapeEditor,
    steps: &[DraftStep],
    finish: DraftFinish,
) -> Result<Outline> {
    for (index, step) in steps.iter().enumerate() {
        match step {
            DraftStep::Click { x, y } => {
                if let Click::Closed(outline) = editor.click(Point::new(*x, *y)) {
                    if index + 1 < steps.len() {
                        return Err(Error::Validation(format!(
                            "Outline closed at step {}, {} steps left over",
                            index,
                            steps.len() - index - 1
                        )));
                    }
                    return Ok(outline);
                }
            }
            DraftStep::Undo => {
                editor.undo();
            }
            DraftStep::GridSize { size } => editor.set_grid_size(*size)?,
            DraftStep::Snap { enabled } => editor.set_snap(*enabled),
        }
    }

    match finish {
        DraftFinish::Open | DraftFinish::Closed => {
            let mode = if finish == DraftFinish::Open {
                FinishMode::Open
            } else {
                FinishMode::Closed
            };
            let placed = editor.points().len();
            editor.finish(mode).ok_or_else(|| {
                Error::Validation(format!(
                    "Not enough points to finish a {:?} outline: {} placed, {} needed",
                    mode,
                    placed,
                    mode.min_points()
                ))
            })
        }
        DraftFinish::Building => editor.close_building(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(x: f64, y: f64) -> DraftStep {
        DraftStep::Click { x, y }
    }

    #[test]
    fn test_auto_close_ends_session() {
        let mut editor = ShapeEditor::new(20).unwrap();
        let steps = [click(21.0, 19.0), click(101.0, 5.0), click(22.0, 18.0)];
        let outline = replay(&mut editor, &steps, DraftFinish::Open).unwrap();
        assert!(outline.closed);
        assert_eq!(outline.points.len(), 2);
    }

    #[test]
    fn test_steps_after_close_rejected() {
        let mut editor = ShapeEditor::new(20).unwrap();
        let steps = [
            click(21.0, 19.0),
            click(101.0, 5.0),
            click(22.0, 18.0),
            click(200.0, 200.0),
        ];
        assert!(matches!(
            replay(&mut editor, &steps, DraftFinish::Open),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_undo_and_grid_change() {
        let mut editor = ShapeEditor::new(20).unwrap();
        let steps = [
            click(0.0, 0.0),
            click(58.0, 0.0),
            DraftStep::Undo,
            DraftStep::GridSize { size: 50 },
            click(130.0, 0.0),
            click(130.0, 130.0),
        ];
        let outline = replay(&mut editor, &steps, DraftFinish::Closed).unwrap();
        assert_eq!(
            outline.points,
            vec![
                Point::new(0.0, 0.0),
                Point::new(150.0, 0.0),
                Point::new(150.0, 150.0)
            ]
        );
        assert!(outline.closed);
    }

    #[test]
    fn test_finish_failures() {
        let mut editor = ShapeEditor::new(20).unwrap();
        let two = [click(0.0, 0.0), click(100.0, 0.0)];
        assert!(replay(&mut editor, &two, DraftFinish::Closed).is_err());
        assert!(editor.points().is_empty());

        let mut editor = ShapeEditor::new(20).unwrap();
        assert!(replay(&mut editor, &two, DraftFinish::Building).is_err());
        assert_eq!(editor.points().len(), 2);

        let mut editor = ShapeEditor::new(20).unwrap();
        let outline = replay(&mut editor, &two, DraftFinish::Open).unwrap();
        assert!(!outline.closed);
    }

    #[test]
    fn test_step_wire_format() {
        let steps: Vec<DraftStep> = serde_json::from_str(
            r#"[
                {"op": "click", "x": 1.0, "y": 2.0},
                {"op": "undo"},
                {"op": "grid_size", "size": 30},
                {"op": "snap", "enabled": false}
            ]"#,
        )
        .unwrap();
        assert_eq!(steps[1], DraftStep::Undo);
        assert_eq!(steps[2], DraftStep::GridSize { size: 30 });
    }
}
