use once_cell::sync::Lazy;
use regex::Regex;

pub(crate) const HEADER_MARKER: &str = "@H";

const WHITE_TAG: &str = "[White \"";

/// `<tournament-date> <event>, <site> # <game-date>`, the tournament description is everything
/// between the leading date and the first ` # `. Literal `#` inside it is doubled, so ` # ` is
/// unambiguous. Dates are ASCII digits only.
static SORT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4})-([0-9]{2})-[0-9]{2} (.+?) # ([0-9]{4}-[0-9]{2}-[0-9]{2})").unwrap()
});

/// Width of the leading `YYYY-MM-DD` tournament date
pub(crate) const DATE_WIDTH: usize = 10;

/// The parsed head of a record's sort prefix.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct SortPrefix<'a> {
    year: u32,
    month: u32,
    tournament: &'a str,
    game_date: &'a str,
    day_key: &'a str,
}

impl<'a> SortPrefix<'a> {
    /// Parse the head of `line`, `None` for lines without a recognizable dated prefix. Only the
    /// sort prefix is looked at, header values and move text never take part.
    pub(crate) fn parse(line: &'a str) -> Option<SortPrefix<'a>> {
        let captures = SORT_PREFIX.captures(sort_prefix(line))?;
        let year = captures.get(1)?.as_str().parse::<u32>().ok()?;
        let month = captures.get(2)?.as_str().parse::<u32>().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        let tournament = captures.get(3)?.as_str();
        let game_date = captures.get(4)?;
        Some(
            SortPrefix {
                year,
                month,
                tournament,
                game_date: game_date.as_str(),
                day_key: &line[..game_date.end()],
            }
        )
    }

    pub(crate) fn year(&self) -> u32 {
        self.year
    }

    pub(crate) fn month(&self) -> u32 {
        self.month
    }

    /// `<event>, <site>`
    pub(crate) fn tournament(&self) -> &'a str {
        self.tournament
    }

    pub(crate) fn game_date(&self) -> &'a str {
        self.game_date
    }

    /// Everything up to and including the game date
    pub(crate) fn day_key(&self) -> &'a str {
        self.day_key
    }
}

/// The portion of `line` before the first `@H`, the whole line when there is none.
pub(crate) fn sort_prefix(line: &str) -> &str {
    match line.find(HEADER_MARKER) {
        Some(position) => &line[..position],
        None => line,
    }
}

/// Bucket key for the day bucketed dedup. Lines without a dated prefix fall back to their whole
/// sort prefix so they only ever share a bucket with an identical prefix.
pub(crate) fn day_key(line: &str) -> &str {
    match SortPrefix::parse(line) {
        Some(prefix) => prefix.day_key(),
        None => sort_prefix(line),
    }
}

/// Replace the leading tournament date with `start_date`.
pub(crate) fn redate(line: &str, start_date: &str) -> String {
    let mut result = String::with_capacity(line.len());
    result.push_str(start_date);
    result.push_str(&line[DATE_WIDTH..]);
    result
}

/// Prefix the value of the `White` header tag with `label`, e.g. `KEEP `. Records without a White
/// tag get the label in front of the whole line.
pub(crate) fn label_white(line: &str, label: &str) -> String {
    let headers = line.find(HEADER_MARKER).unwrap_or(0);
    match line[headers..].find(WHITE_TAG) {
        Some(position) => {
            let insert_at = headers + position + WHITE_TAG.len();
            let mut result = String::with_capacity(line.len() + label.len());
            result.push_str(&line[..insert_at]);
            result.push_str(label);
            result.push_str(&line[insert_at..]);
            result
        }
        None => format!("{label}{line}"),
    }
}
