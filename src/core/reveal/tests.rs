use super::*;

const TICK: Duration = Duration::from_millis(10);

fn run_to_end(reveal: &mut TextReveal, start: Instant) -> Vec<String> {
    let mut frames = Vec::new();
    let mut now = start;
    while reveal.is_animating() {
        now += TICK;
        if reveal.advance(now) {
            frames.push(reveal.displayed().to_string());
        }
    }
    frames
}

#[test]
fn reveals_one_character_per_tick_then_idles() {
    let start = Instant::now();
    let mut reveal = TextReveal::new(10);
    reveal.set_source("abc", start);

    assert_eq!(reveal.displayed(), "");
    assert_eq!(reveal.next_deadline(), Some(start + TICK));

    let frames = run_to_end(&mut reveal, start);
    assert_eq!(frames, ["a", "ab", "abc"]);
    assert!(!reveal.is_animating());
    assert!(reveal.is_complete());
    assert!(!reveal.advance(start + TICK * 100));
}

#[test]
fn every_frame_is_a_prefix_of_the_source() {
    let text = "Ferris says: héllo, wörld 🦀!";
    let start = Instant::now();
    let mut reveal = TextReveal::new(3);
    reveal.set_source(text, start);

    let mut now = start;
    while reveal.is_animating() {
        now += Duration::from_millis(1);
        reveal.advance(now);
        assert!(text.starts_with(reveal.displayed()));
    }
    assert_eq!(reveal.displayed(), text);
}

#[test]
fn late_polls_catch_up_on_missed_ticks() {
    let start = Instant::now();
    let mut reveal = TextReveal::new(10);
    reveal.set_source("abcdef", start);

    assert!(reveal.advance(start + Duration::from_millis(35)));
    assert_eq!(reveal.displayed(), "abc");
    assert_eq!(reveal.next_deadline(), Some(start + Duration::from_millis(40)));
}

#[test]
fn growing_source_continues_where_it_left_off() {
    let start = Instant::now();
    let mut reveal = TextReveal::new(10);
    reveal.set_source("Hel", start);
    reveal.advance(start + TICK * 2);
    assert_eq!(reveal.displayed(), "He");

    let later = start + TICK * 2;
    reveal.set_source("Hello", later);
    assert_eq!(reveal.displayed(), "He");
    assert_eq!(reveal.next_deadline(), Some(later + TICK));

    let frames = run_to_end(&mut reveal, later);
    assert_eq!(frames, ["Hel", "Hell", "Hello"]);
}

#[test]
fn shorter_source_restarts_from_empty() {
    let start = Instant::now();
    let mut reveal = TextReveal::new(10);
    reveal.set_source("a long first answer", start);
    reveal.advance(start + TICK * 8);
    assert_eq!(reveal.revealed_len(), 8);

    let later = start + TICK * 8;
    reveal.set_source("brief", later);
    assert_eq!(reveal.displayed(), "");
    let frames = run_to_end(&mut reveal, later);
    assert_eq!(frames, ["b", "br", "bri", "brie", "brief"]);
}

#[test]
fn empty_source_clears_immediately() {
    let start = Instant::now();
    let mut reveal = TextReveal::new(10);
    reveal.set_source("abc", start);
    reveal.advance(start + TICK * 2);

    reveal.set_source("", start + TICK * 2);
    assert_eq!(reveal.displayed(), "");
    assert!(!reveal.is_animating());

    reveal.set_source_opt(None, start + TICK * 3);
    assert_eq!(reveal.displayed(), "");
}

#[test]
fn pointer_past_new_length_snaps_to_full_text() {
    let start = Instant::now();
    let mut reveal = TextReveal::new(10);
    reveal.set_source("abcdef", start);
    reveal.advance(start + TICK * 4);
    assert_eq!(reveal.displayed(), "abcd");

    // Same length as the revealed prefix: not shorter, so no restart, and the
    // pointer already covers it.
    reveal.set_source("wxyz", start + TICK * 4);
    assert_eq!(reveal.displayed(), "wxyz");
    assert!(!reveal.is_animating());
}

#[test]
fn same_length_replacement_is_treated_as_continuation() {
    let start = Instant::now();
    let mut reveal = TextReveal::new(10);
    reveal.set_source("abcdef", start);
    reveal.advance(start + TICK * 2);

    reveal.set_source("uvwxyz", start + TICK * 2);
    assert_eq!(reveal.displayed(), "uv");
    assert!(reveal.is_animating());
}

#[test]
fn non_positive_speed_reveals_everything_at_once() {
    let now = Instant::now();
    for speed in [0, -5] {
        let mut reveal = TextReveal::new(speed);
        reveal.set_source("instant", now);
        assert_eq!(reveal.displayed(), "instant");
        assert!(!reveal.is_animating());
        assert!(!reveal.advance(now + TICK));
    }
}

#[test]
fn unchanged_source_does_not_reschedule() {
    let start = Instant::now();
    let mut reveal = TextReveal::new(10);
    reveal.set_source("abc", start);
    reveal.set_source("abc", start + Duration::from_millis(7));
    assert_eq!(reveal.next_deadline(), Some(start + TICK));
}

#[test]
fn new_cycle_replaces_the_pending_tick() {
    let start = Instant::now();
    let mut reveal = TextReveal::new(10);
    reveal.set_source("ab", start);
    let restarted_at = start + Duration::from_millis(4);
    reveal.set_source("abcd", restarted_at);

    assert_eq!(reveal.next_deadline(), Some(restarted_at + TICK));
    assert!(!reveal.advance(start + TICK));
    assert_eq!(reveal.displayed(), "");
}

#[test]
fn instances_are_independent() {
    let start = Instant::now();
    let mut first = TextReveal::new(10);
    let mut second = TextReveal::new(20);
    first.set_source("aaaa", start);
    second.set_source("bbbb", start);

    first.advance(start + TICK * 2);
    second.advance(start + TICK * 2);
    assert_eq!(first.displayed(), "aa");
    assert_eq!(second.displayed(), "b");

    first.cancel();
    assert!(!first.is_animating());
    assert!(second.is_animating());
}

#[test]
fn graphemes_are_never_split() {
    let start = Instant::now();
    let mut reveal = TextReveal::new(10);
    let text = "e\u{301}👩‍🔬";
    reveal.set_source(text, start);
    reveal.advance(start + TICK);
    assert_eq!(reveal.displayed(), "e\u{301}");
    reveal.advance(start + TICK * 2);
    assert_eq!(reveal.displayed(), text);
    assert!(!reveal.is_animating());
}
