use rutube::{Quality, RutubeError, RutubeResult};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Picks a quality from user input.
///
/// Accepts the 1-based index of the list, a `WIDTHxHEIGHT` value, or an empty
/// line for the best quality.
pub fn parse_choice(input: &str, qualities: &[Quality]) -> Option<Quality> {
    let input = input.trim();
    if input.is_empty() {
        return qualities.last().copied();
    }

    if let Ok(index) = input.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| qualities.get(i)).copied();
    }

    input
        .parse::<Quality>()
        .ok()
        .filter(|quality| qualities.contains(quality))
}

/// Asks for a quality until the answer is valid. The best one is used when input ends.
pub async fn choose_quality<R>(input: R, qualities: &[Quality]) -> RutubeResult<Quality>
where
    R: AsyncBufRead + Unpin,
{
    let best = qualities
        .last()
        .copied()
        .ok_or(RutubeError::MasterPlaylistInitialization)?;

    eprintln!("Available qualities:");
    for (index, quality) in qualities.iter().enumerate() {
        eprintln!("  {}) {quality}", index + 1);
    }

    let mut lines = input.lines();
    loop {
        eprint!("Choose quality [{}]: ", qualities.len());
        let Some(line) = lines.next_line().await? else {
            eprintln!();
            return Ok(best);
        };
        match parse_choice(&line, qualities) {
            Some(quality) => return Ok(quality),
            None => eprintln!("Invalid choice: {}", line.trim()),
        }
    }
}
