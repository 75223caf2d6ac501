/// Options for [`split_by`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitOptions {
    /// Drop the splitter items instead of emitting each as a singleton group.
    pub exclude_splitter: bool,
}

/// Partition `items` into contiguous groups at every item matching `is_splitter`.
///
/// With default options every splitter becomes its own one-item group, placed
/// right after the run of non-splitters that precedes it:
///
/// ```text
/// [p, p, H, p, p, H, p]  =>  [p, p] [H] [p, p] [H] [p]
/// ```
///
/// The result always starts and ends with a (possibly empty) run of
/// non-splitters, so empty input yields one empty group and two adjacent
/// splitters have an empty group between them.
pub fn split_by<'a, T>(
    items: &'a [T],
    is_splitter: impl Fn(&T) -> bool,
    options: SplitOptions,
) -> Vec<&'a [T]> {
    let mut groups = Vec::new();
    let mut run_start = 0;

    for (idx, item) in items.iter().enumerate() {
        if !is_splitter(item) {
            continue;
        }
        groups.push(&items[run_start..idx]);
        if !options.exclude_splitter {
            groups.push(&items[idx..=idx]);
        }
        run_start = idx + 1;
    }

    groups.push(&items[run_start..]);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_heading(s: &&str) -> bool {
        s.starts_with('#')
    }

    #[test]
    fn splits_around_headings() {
        let items = ["a", "b", "#1", "c", "d", "#2", "e"];
        let groups = split_by(&items, is_heading, SplitOptions::default());
        assert_eq!(
            groups,
            vec![&["a", "b"][..], &["#1"], &["c", "d"], &["#2"], &["e"]]
        );
    }

    #[test]
    fn excluding_splitters_keeps_only_runs() {
        let items = ["a", "#1", "b"];
        let groups = split_by(
            &items,
            is_heading,
            SplitOptions {
                exclude_splitter: true,
            },
        );
        assert_eq!(groups, vec![&["a"][..], &["b"]]);
    }

    #[test]
    fn empty_input_is_one_empty_group() {
        let items: [&str; 0] = [];
        let groups = split_by(&items, is_heading, SplitOptions::default());
        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_empty());
    }

    #[test]
    fn no_match_is_one_group() {
        let items = ["a", "b", "c"];
        let groups = split_by(&items, is_heading, SplitOptions::default());
        assert_eq!(groups, vec![&items[..]]);
    }

    #[test]
    fn adjacent_and_edge_splitters_leave_empty_runs() {
        let items = ["#1", "#2"];
        let groups = split_by(&items, is_heading, SplitOptions::default());
        let empty: &[&str] = &[];
        assert_eq!(groups, vec![empty, &["#1"], empty, &["#2"], empty]);
    }
}
