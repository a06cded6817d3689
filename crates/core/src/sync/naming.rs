//! Copy naming
//!
//! Copies are named `stem(N).ext`, with the first free `N` starting at 0.

/// Name of the `n`th copy of `title`
///
/// ```
/// use gd_core::sync::copy_name;
///
/// assert_eq!(copy_name("report.txt", 0), "report(0).txt");
/// assert_eq!(copy_name("Makefile", 2), "Makefile(2)");
/// ```
pub fn copy_name(title: &str, n: u32) -> String {
    match title.rfind('.') {
        Some(dot) if dot > 0 => format!("{}({n}){}", &title[..dot], &title[dot..]),
        _ => format!("{title}({n})"),
    }
}

/// First copy name of `title` for which `taken` returns false
pub fn first_free_copy_name<F>(title: &str, mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let mut n = 0;
    loop {
        let candidate = copy_name(title, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
