use super::*;

#[test]
fn basic_properties() {
    let span = Span::new(10, 20);
    assert_eq!(span.len(), 10);
    assert!(!span.is_empty());
    assert!(span.contains(15));
    assert!(!span.contains(20));
}

#[test]
fn merge_covers_both() {
    let merged = Span::new(10, 20).merge(Span::new(15, 30));
    assert_eq!(merged, Span::new(10, 30));
}

#[test]
fn spans_order_by_start_then_end() {
    let mut spans = vec![Span::new(8, 9), Span::new(2, 7), Span::new(2, 4)];
    spans.sort();
    assert_eq!(spans, vec![Span::new(2, 4), Span::new(2, 7), Span::new(8, 9)]);
}

#[test]
fn try_from_range_rejects_oversized_offsets() {
    let too_big = (u32::MAX as usize) + 1;
    assert_eq!(
        Span::try_from_range(0..too_big),
        Err(SpanError::EndTooLarge(too_big))
    );
    assert_eq!(Span::try_from_range(3..9), Ok(Span::new(3, 9)));
}

#[test]
fn inverted_span_is_empty() {
    let span = Span::new(9, 3);
    assert!(span.is_empty());
    assert_eq!(span.len(), 0);
}
