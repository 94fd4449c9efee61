//! Authoritative hero state and its status transitions.

use heist_core::{
    CellCoord, HeroColor, HeroId, HeroSnapshot, HeroStatus, HeroView, MoveError, SelectionError,
};

/// Hero token stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Hero {
    pub(crate) id: HeroId,
    pub(crate) color: HeroColor,
    pub(crate) cell: CellCoord,
    pub(crate) status: HeroStatus,
}

impl Hero {
    fn snapshot(&self) -> HeroSnapshot {
        HeroSnapshot {
            id: self.id,
            color: self.color,
            cell: self.cell,
            status: self.status,
        }
    }
}

/// Registry of every hero in the game, ordered by identifier.
#[derive(Clone, Debug, Default)]
pub(crate) struct Roster {
    heroes: Vec<Hero>,
}

impl Roster {
    pub(crate) fn new(mut heroes: Vec<Hero>) -> Self {
        heroes.sort_by_key(|hero| hero.id);
        Self { heroes }
    }

    pub(crate) fn view(&self) -> HeroView {
        HeroView::from_snapshots(self.heroes.iter().map(Hero::snapshot).collect())
    }

    pub(crate) fn get(&self, hero: HeroId) -> Option<&Hero> {
        self.heroes.iter().find(|candidate| candidate.id == hero)
    }

    fn get_mut(&mut self, hero: HeroId) -> Option<&mut Hero> {
        self.heroes.iter_mut().find(|candidate| candidate.id == hero)
    }

    fn occupant(&self, cell: CellCoord) -> Option<HeroId> {
        self.heroes
            .iter()
            .find(|hero| hero.cell == cell && hero.status != HeroStatus::Exited)
            .map(|hero| hero.id)
    }

    pub(crate) fn all_exited(&self) -> bool {
        !self.heroes.is_empty()
            && self
                .heroes
                .iter()
                .all(|hero| hero.status == HeroStatus::Exited)
    }

    /// Moves a hero from `set` to `selected`; at most one hero may be selected.
    pub(crate) fn select(&mut self, hero: HeroId) -> Result<(), SelectionError> {
        if let Some(other) = self
            .heroes
            .iter()
            .find(|candidate| candidate.status == HeroStatus::Selected && candidate.id != hero)
        {
            return Err(SelectionError::AnotherSelected(other.id));
        }

        let entry = self.get_mut(hero).ok_or(SelectionError::UnknownHero)?;
        match entry.status {
            HeroStatus::Set => {
                entry.status = HeroStatus::Selected;
                Ok(())
            }
            status => Err(SelectionError::NotSelectable(status)),
        }
    }

    pub(crate) fn deselect(&mut self, hero: HeroId) -> Result<(), SelectionError> {
        let entry = self.get_mut(hero).ok_or(SelectionError::UnknownHero)?;
        if entry.status != HeroStatus::Selected {
            return Err(SelectionError::NotSelected);
        }
        entry.status = HeroStatus::Set;
        Ok(())
    }

    /// Validates a commit against the roster without mutating it.
    pub(crate) fn validate_move(&self, hero: HeroId, to: CellCoord) -> Result<CellCoord, MoveError> {
        let entry = self.get(hero).ok_or(MoveError::UnknownHero)?;
        match entry.status {
            HeroStatus::Exited => return Err(MoveError::Exited),
            HeroStatus::Moving => return Err(MoveError::InTransit),
            HeroStatus::Set | HeroStatus::Selected => {}
        }
        if entry.cell == to {
            return Err(MoveError::Stationary);
        }
        if self.occupant(to).is_some() {
            return Err(MoveError::Occupied);
        }
        Ok(entry.cell)
    }

    /// Applies a commit previously accepted by [`Roster::validate_move`].
    pub(crate) fn commit_move(&mut self, hero: HeroId, to: CellCoord) {
        if let Some(entry) = self.get_mut(hero) {
            entry.cell = to;
            entry.status = HeroStatus::Moving;
        }
    }

    /// Applies a move a peer already committed; the hero keeps its status.
    pub(crate) fn relocate(&mut self, hero: HeroId, to: CellCoord) {
        if let Some(entry) = self.get_mut(hero) {
            entry.cell = to;
        }
    }

    /// Moves a travelling hero back to `set`, returning the cell it landed on.
    pub(crate) fn settle(&mut self, hero: HeroId) -> Option<CellCoord> {
        let entry = self.get_mut(hero)?;
        if entry.status != HeroStatus::Moving {
            return None;
        }
        entry.status = HeroStatus::Set;
        Some(entry.cell)
    }

    /// Marks a hero as exited, returning its cell if the transition happened.
    pub(crate) fn exit(&mut self, hero: HeroId) -> Option<CellCoord> {
        let entry = self.get_mut(hero)?;
        if entry.status == HeroStatus::Exited {
            return None;
        }
        entry.status = HeroStatus::Exited;
        Some(entry.cell)
    }
}
