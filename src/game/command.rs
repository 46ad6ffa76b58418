//! Command Parsing
//!
//! Turns one input line into a tagged [`Command`]. Grammars differ by role
//! and keywords are case-insensitive. Anything that does not match the
//! role's grammar becomes [`Command::Unrecognized`]; parsing never fails.

use crate::core::direction::Direction;
use crate::core::point::Point;
use crate::game::outcome::Role;

/// A decoded player command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Do nothing this turn.
    Pass,
    /// Hunter: place wall `id` between two endpoints.
    PlaceWall {
        /// Wall id.
        id: u32,
        /// First endpoint.
        start: Point,
        /// Second endpoint.
        end: Point,
    },
    /// Hunter: remove wall `id`.
    RemoveWall {
        /// Wall id.
        id: u32,
    },
    /// Prey: move to an absolute cell.
    MoveTo(Point),
    /// Prey: move one cell in a compass direction.
    MoveDirection(Direction),
    /// Input that fits no grammar for the role.
    Unrecognized,
}

impl Command {
    /// Whether this command is an explicit pass.
    pub fn is_pass(&self) -> bool {
        matches!(self, Command::Pass)
    }
}

/// Parse a line with the grammar for `role`.
pub fn parse_command(role: Role, line: &str) -> Command {
    match role {
        Role::Hunter => parse_hunter(line),
        Role::Prey => parse_prey(line),
    }
}

/// Hunter grammar: `PASS` | `ADD <id> (<x1>,<y1>) (<x2>,<y2>)` | `REMOVE <id>`.
pub fn parse_hunter(line: &str) -> Command {
    let line = line.trim();
    let (keyword, rest) = split_keyword(line);

    if keyword.eq_ignore_ascii_case("PASS") && rest.is_empty() {
        return Command::Pass;
    }

    if keyword.eq_ignore_ascii_case("ADD") {
        let (id, points) = split_keyword(rest);
        let Ok(id) = id.parse::<u32>() else {
            return Command::Unrecognized;
        };
        return match parse_points(points).as_deref() {
            Some([start, end]) => Command::PlaceWall { id, start: *start, end: *end },
            _ => Command::Unrecognized,
        };
    }

    if keyword.eq_ignore_ascii_case("REMOVE") {
        return match rest.parse::<u32>() {
            Ok(id) => Command::RemoveWall { id },
            Err(_) => Command::Unrecognized,
        };
    }

    Command::Unrecognized
}

/// Prey grammar: `PASS` | `(<x>,<y>)` | one of `N S E W NE NW SE SW`.
pub fn parse_prey(line: &str) -> Command {
    let line = line.trim();

    if line.eq_ignore_ascii_case("PASS") {
        return Command::Pass;
    }

    if let Some(direction) = Direction::from_token(line) {
        return Command::MoveDirection(direction);
    }

    match parse_points(line).as_deref() {
        Some([target]) => Command::MoveTo(*target),
        _ => Command::Unrecognized,
    }
}

/// Split off the first whitespace-delimited token.
fn split_keyword(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(idx) => (&s[..idx], s[idx..].trim()),
        None => (s, ""),
    }
}

/// Parse a run of `(x,y)` groups separated by whitespace.
///
/// Whitespace inside a group is allowed. Returns `None` on any stray text.
fn parse_points(s: &str) -> Option<Vec<Point>> {
    let mut points = Vec::new();
    let mut rest = s.trim();

    while !rest.is_empty() {
        let body = rest.strip_prefix('(')?;
        let close = body.find(')')?;
        let (x, y) = body[..close].split_once(',')?;
        let x = x.trim().parse::<i32>().ok()?;
        let y = y.trim().parse::<i32>().ok()?;
        points.push(Point::new(x, y));
        rest = body[close + 1..].trim_start();
    }

    if points.is_empty() {
        None
    } else {
        Some(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hunter_pass() {
        assert_eq!(parse_hunter("PASS"), Command::Pass);
        assert_eq!(parse_hunter("  pass \r"), Command::Pass);
        assert_eq!(parse_hunter("pass now"), Command::Unrecognized);
    }

    #[test]
    fn test_hunter_add() {
        assert_eq!(
            parse_hunter("ADD 3 (10,20) (10,40)"),
            Command::PlaceWall { id: 3, start: Point::new(10, 20), end: Point::new(10, 40) }
        );
        assert_eq!(
            parse_hunter("add 7 ( 10 , 10 )(10,10)"),
            Command::PlaceWall { id: 7, start: Point::new(10, 10), end: Point::new(10, 10) }
        );
    }

    #[test]
    fn test_hunter_add_malformed() {
        assert_eq!(parse_hunter("ADD x (1,2) (1,3)"), Command::Unrecognized);
        assert_eq!(parse_hunter("ADD 1 (1,2)"), Command::Unrecognized);
        assert_eq!(parse_hunter("ADD 1 (1,2) (1,3) (1,4)"), Command::Unrecognized);
        assert_eq!(parse_hunter("ADD 1 (1,2) (1,3"), Command::Unrecognized);
        assert_eq!(parse_hunter("ADD 1 1,2 1,3"), Command::Unrecognized);
        assert_eq!(parse_hunter("ADD -1 (1,2) (1,3)"), Command::Unrecognized);
        assert_eq!(parse_hunter("ADD"), Command::Unrecognized);
    }

    #[test]
    fn test_hunter_remove() {
        assert_eq!(parse_hunter("REMOVE 4"), Command::RemoveWall { id: 4 });
        assert_eq!(parse_hunter("Remove 12"), Command::RemoveWall { id: 12 });
        assert_eq!(parse_hunter("REMOVE"), Command::Unrecognized);
        assert_eq!(parse_hunter("REMOVE four"), Command::Unrecognized);
    }

    #[test]
    fn test_hunter_rejects_prey_grammar() {
        assert_eq!(parse_hunter("(3,4)"), Command::Unrecognized);
        assert_eq!(parse_hunter("NE"), Command::Unrecognized);
        assert_eq!(parse_hunter(""), Command::Unrecognized);
    }

    #[test]
    fn test_prey_absolute_move() {
        assert_eq!(parse_prey("(321,201)"), Command::MoveTo(Point::new(321, 201)));
        assert_eq!(parse_prey(" ( 5, -1 ) "), Command::MoveTo(Point::new(5, -1)));
        assert_eq!(parse_prey("(1,2) (3,4)"), Command::Unrecognized);
        assert_eq!(parse_prey("(1;2)"), Command::Unrecognized);
    }

    #[test]
    fn test_prey_compass() {
        assert_eq!(parse_prey("N"), Command::MoveDirection(Direction::North));
        assert_eq!(parse_prey("sw"), Command::MoveDirection(Direction::SouthWest));
        assert_eq!(parse_prey("NNE"), Command::Unrecognized);
    }

    #[test]
    fn test_prey_rejects_hunter_grammar() {
        assert_eq!(parse_prey("ADD 1 (1,2) (1,3)"), Command::Unrecognized);
        assert_eq!(parse_prey("REMOVE 1"), Command::Unrecognized);
        assert_eq!(parse_prey("Pass"), Command::Pass);
    }

    #[test]
    fn test_parse_by_role() {
        assert_eq!(parse_command(Role::Hunter, "N"), Command::Unrecognized);
        assert_eq!(parse_command(Role::Prey, "N"), Command::MoveDirection(Direction::North));
    }
}
