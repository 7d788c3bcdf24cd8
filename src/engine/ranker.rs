// ==========================================
// 加气混凝土质量分析 - 排序截取引擎
// ==========================================
// 职责: 按数值键降序稳定排序, 截取前 N 项
// 红线: 键相等时保持原相对顺序; 不足 N 项时原样返回, 不补齐
// ==========================================

/// 按 key 降序稳定排序（不截断）
pub fn sort_descending<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| key(b).total_cmp(&key(a)));
}

/// 降序稳定排序后截取前 n 项
pub fn top_n<T, F>(items: impl IntoIterator<Item = T>, key: F, n: usize) -> Vec<T>
where
    F: Fn(&T) -> f64,
{
    let mut ranked: Vec<T> = items.into_iter().collect();
    sort_descending(&mut ranked, key);
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_n_length_law() {
        let items: Vec<(usize, f64)> = (0..8).map(|i| (i, (i * 37 % 11) as f64)).collect();
        for n in 0..12 {
            let ranked = top_n(items.clone(), |(_, v)| *v, n);
            assert_eq!(ranked.len(), n.min(items.len()));
            assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
        }
    }

    #[test]
    fn test_ties_keep_original_order() {
        let items = vec![("a", 1.0), ("b", 2.0), ("c", 1.0), ("d", 2.0), ("e", 0.5)];
        let ranked = top_n(items, |(_, v)| *v, 10);
        let names: Vec<&str> = ranked.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["b", "d", "a", "c", "e"]);
    }

    #[test]
    fn test_top_n_truncates() {
        let items: Vec<u64> = (1..=15).collect();
        let ranked = top_n(items, |v| *v as f64, 10);
        assert_eq!(ranked, (6..=15).rev().collect::<Vec<u64>>());
    }

    #[test]
    fn test_empty_input() {
        let ranked: Vec<f64> = top_n(Vec::<f64>::new(), |v| *v, 10);
        assert!(ranked.is_empty());
    }
}
