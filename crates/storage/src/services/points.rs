//! Competition points awarded for a final rank.
//!
//! This is the only copy of the points table; every caller goes through [`points`].

use crate::models::TournamentClass;

/// Points for finishing at `rank` in an event of a `class` tournament with
/// `competitor_count` competitors. Ranks outside the podium earn nothing.
///
/// | Class | 1st | 2nd | 3rd |
/// |-------|-----|-----|-----|
/// | AAA   | 20  | 15  | 10  |
/// | AA    | 15  | 10  | 8   |
/// | A     | 8   | 5   | 2   |
/// | B     | 5   | 3   | 1   |
/// | C     | 2/1/0 with 4+ competitors, 1/0/0 with 3, nothing below |
pub fn points(class: TournamentClass, rank: i32, competitor_count: usize) -> u32 {
    match class {
        TournamentClass::Aaa => podium(rank, [20, 15, 10]),
        TournamentClass::Aa => podium(rank, [15, 10, 8]),
        TournamentClass::A => podium(rank, [8, 5, 2]),
        TournamentClass::B => podium(rank, [5, 3, 1]),
        TournamentClass::C => match competitor_count {
            n if n >= 4 => podium(rank, [2, 1, 0]),
            3 => podium(rank, [1, 0, 0]),
            _ => 0,
        },
    }
}

fn podium(rank: i32, table: [u32; 3]) -> u32 {
    match rank {
        1 => table[0],
        2 => table[1],
        3 => table[2],
        _ => 0,
    }
}
