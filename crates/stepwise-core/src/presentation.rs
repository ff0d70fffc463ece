//! Group presentation: the staged sample part and the remaining-count label

use crate::catalog::Part;
use crate::grouping::MaterialGroup;
use crate::stage::Stage;

/// The part shown at the group's anchor
///
/// Scans from the highest step backward and returns the first unplaced
/// part, so the preview surfaces the last remaining piece of the group.
/// `None` when every part of the group is placed.
pub fn select_sample(group: &MaterialGroup, parts: &[Part]) -> Option<usize> {
    group
        .ordered_parts()
        .iter()
        .rev()
        .copied()
        .find(|&i| parts.get(i).is_some_and(|p| !p.placed))
}

/// Count label text for a number of remaining parts
pub fn label_text(remaining: usize) -> String {
    format!("x{}", remaining)
}

/// Stage the sample part, hide the other unplaced parts, refresh the label
///
/// Placed parts are left where they are. Idempotent.
pub fn apply_presentation(group: &MaterialGroup, parts: &[Part], stage: &mut dyn Stage) {
    let sample = select_sample(group, parts);

    for &index in group.ordered_parts() {
        let Some(part) = parts.get(index) else {
            continue;
        };
        if part.placed {
            continue;
        }

        if Some(index) == sample {
            stage.set_visible(part.node, true);
            stage.place_at_anchor(part.node, &group.anchor_pose);
        } else {
            stage.set_visible(part.node, false);
        }
    }

    // Shown even at x0; only the terminal step hides labels
    let remaining = group.remaining(parts);
    stage.show_label(&group.material, &label_text(remaining), &group.label_anchor);
}
