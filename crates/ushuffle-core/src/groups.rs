use std::collections::VecDeque;

use rand::Rng;

use crate::models::ProjId;

/// Source of group numbers for inserts, moves and deletes.
pub trait GroupDraw: Send {
    fn draw(&mut self) -> ProjId;
}

/// Uniform draws over `1..=5` from any `rand` generator.
pub struct RandomGroups<R> {
    rng: R,
}

impl<R: Rng + Send> RandomGroups<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> GroupDraw for RandomGroups<R> {
    fn draw(&mut self) -> ProjId {
        let value = self.rng.gen_range(ProjId::MIN..=ProjId::MAX);
        ProjId::new(value).unwrap_or_else(|_| unreachable!("gen_range stays in 1..=5"))
    }
}

/// Replays a fixed sequence, then cycles through it again.
#[derive(Debug, Clone)]
pub struct ScriptedGroups {
    script: Vec<ProjId>,
    queue: VecDeque<ProjId>,
}

impl ScriptedGroups {
    /// # Panics
    /// When `script` is empty.
    pub fn new(script: impl IntoIterator<Item = ProjId>) -> Self {
        let script: Vec<ProjId> = script.into_iter().collect();
        assert!(!script.is_empty(), "scripted draws need at least one group");
        Self {
            queue: script.iter().copied().collect(),
            script,
        }
    }

    pub fn from_values(values: &[i32]) -> Result<Self, crate::RecordError> {
        let script = values
            .iter()
            .map(|&value| ProjId::new(value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(script))
    }
}

impl GroupDraw for ScriptedGroups {
    fn draw(&mut self) -> ProjId {
        if self.queue.is_empty() {
            self.queue.extend(self.script.iter().copied());
        }
        self.queue
            .pop_front()
            .unwrap_or_else(|| unreachable!("script is never empty"))
    }
}

/// Draws a source group and a distinct destination, redrawing the destination
/// until it differs.
pub fn draw_move(draw: &mut dyn GroupDraw) -> (ProjId, ProjId) {
    let from = draw.draw();
    let mut to = draw.draw();
    while to == from {
        to = draw.draw();
    }
    (from, to)
}
