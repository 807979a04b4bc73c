#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure edit-mode system responsible for emitting placement, removal and click commands.

use glam::Vec2;
use hexhold_core::{Command, OffsetCoord, RemovalTarget, ScreenProjection, StructureKind};

/// Interaction mode selected by the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditMode {
    /// Clicks inspect structures and features.
    #[default]
    None,
    /// Clicks place a structure of the carried kind.
    Build(StructureKind),
    /// Clicks remove whatever structure covers the cell.
    Delete,
}

/// Declarative placement preview describing a potential construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementPreview {
    /// Kind of structure proposed for placement.
    pub kind: StructureKind,
    /// Anchor cell under the cursor.
    pub anchor: OffsetCoord,
    /// Indicates whether the preview represents a valid placement location.
    pub placeable: bool,
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BuilderInput {
    /// Indicates whether the player clicked on this frame.
    pub click: bool,
    /// Pointer position in screen space, if the pointer is inside the window.
    pub cursor: Option<Vec2>,
    /// Indicates whether the pointer currently hovers interface elements.
    pub over_ui: bool,
}

impl BuilderInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(click: bool, cursor: Option<Vec2>, over_ui: bool) -> Self {
        Self {
            click,
            cursor,
            over_ui,
        }
    }
}

/// Edit-mode system that translates pointer input into world commands.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    mode: EditMode,
}

impl Builder {
    /// Creates a new builder system instance in [`EditMode::None`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: EditMode::None,
        }
    }

    /// Currently selected edit mode.
    #[must_use]
    pub const fn mode(&self) -> EditMode {
        self.mode
    }

    /// Switches to `mode` for subsequent clicks.
    pub fn set_mode(&mut self, mode: EditMode) {
        self.mode = mode;
    }

    /// Consumes one frame of input and emits the command the click stands for.
    ///
    /// Clicks over interface elements or outside the projected grid are
    /// dropped. Build and delete clicks settle with the economy.
    pub fn handle<P>(&mut self, input: BuilderInput, projection: &P, out: &mut Vec<Command>)
    where
        P: ScreenProjection + ?Sized,
    {
        if !input.click || input.over_ui {
            return;
        }
        let Some(offset) = input
            .cursor
            .and_then(|cursor| selected_offset(cursor, projection))
        else {
            return;
        };

        out.push(match self.mode {
            EditMode::None => Command::Click { offset },
            EditMode::Build(kind) => Command::PlaceStructure {
                kind,
                anchor: offset,
                settle: true,
            },
            EditMode::Delete => Command::RemoveStructure {
                target: RemovalTarget::Tile(offset),
                settle: true,
            },
        });
    }

    /// Builds a placement preview for the hovered cell while in build mode.
    ///
    /// The `is_placeable` closure should mirror the world's
    /// `query::is_placeable_structure` helper.
    pub fn preview<P, F>(
        &self,
        input: BuilderInput,
        projection: &P,
        mut is_placeable: F,
    ) -> Option<PlacementPreview>
    where
        P: ScreenProjection + ?Sized,
        F: FnMut(OffsetCoord, StructureKind) -> bool,
    {
        let EditMode::Build(kind) = self.mode else {
            return None;
        };
        if input.over_ui {
            return None;
        }
        let anchor = selected_offset(input.cursor?, projection)?;
        Some(PlacementPreview {
            kind,
            anchor,
            placeable: is_placeable(anchor, kind),
        })
    }
}

/// Cell under the pointer according to the screen projection.
#[must_use]
pub fn selected_offset<P>(cursor: Vec2, projection: &P) -> Option<OffsetCoord>
where
    P: ScreenProjection + ?Sized,
{
    projection.screen_to_offset(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<OffsetCoord>);

    impl ScreenProjection for Fixed {
        fn screen_to_offset(&self, _point: Vec2) -> Option<OffsetCoord> {
            self.0
        }
    }

    #[test]
    fn starts_in_inspection_mode() {
        assert_eq!(Builder::new().mode(), EditMode::None);
        assert_eq!(Builder::default().mode(), EditMode::None);
    }

    #[test]
    fn hover_without_click_emits_nothing() {
        let mut builder = Builder::new();
        let mut commands = Vec::new();

        builder.handle(
            BuilderInput::new(false, Some(Vec2::ZERO), false),
            &Fixed(Some(OffsetCoord::new(1, 1))),
            &mut commands,
        );

        assert!(commands.is_empty());
    }

    #[test]
    fn preview_requires_build_mode() {
        let builder = Builder::new();
        let input = BuilderInput::new(false, Some(Vec2::ZERO), false);

        assert!(builder
            .preview(input, &Fixed(Some(OffsetCoord::new(0, 0))), |_, _| true)
            .is_none());
    }
}
