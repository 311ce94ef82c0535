//! Word lists for the content filter.

/// Always rejected. Tokens of four or more characters also match inside words.
pub const STRICT: &[&str] = &[
    // Vietnamese
    "đm", "dm", "đmm", "dmm", "đcm", "dcm", "đệch", "dech", "địt", "dit", "đụ", "vl", "vcl", "vkl",
    "lồn", "loz", "cặc", "buồi", "clgt", "clmm", "đĩ", "cứt", "đéo",
    // English
    "fuck", "fucking", "shit", "bitch", "pussy", "cunt", "motherfucker", "nigga", "nigger",
    // Keyboard mashing
    "zzz", "xxx", "asdf", "qwer", "qwerty",
];

/// Context-sensitive tokens and the phrases that make them offensive.
///
/// These words appear in real titles and lyrics, so they are only rejected
/// inside one of their mapped phrases or, for [`NEVER_ALONE`], as the whole
/// query.
pub const CONTEXT: &[(&str, &[&str])] = &[
    ("mẹ", &["con mẹ mày", "mẹ mày", "đụ mẹ", "địt mẹ", "đéo mẹ", "mẹ kiếp"]),
    ("má", &["đụ má", "địt má", "má mày", "con má mày"]),
    ("bố", &["bố mày", "bố láo", "bố đời"]),
    ("cha", &["cha mày", "thằng cha mày"]),
    ("chó", &["đồ chó", "con chó mày", "chó chết", "thằng chó", "óc chó"]),
    ("cho", &[]),
    ("vãi", &["vãi lồn", "vãi cả lồn", "vãi cứt"]),
    ("gái", &["gái gọi", "gái điếm", "gái bán hoa"]),
    ("cave", &[]),
    ("cc", &[]),
    ("lol", &[]),
    ("me", &["fuck me", "suck me"]),
    ("ass", &["kiss my ass", "dumb ass", "kick your ass", "fat ass"]),
    ("damn", &["god damn you", "damn you"]),
    ("dick", &["suck my dick", "suck dick", "dick head"]),
    ("cock", &["suck my cock", "suck cock"]),
];

/// Context tokens rejected when they are the entire query.
pub const NEVER_ALONE: &[&str] = &[
    "mẹ", "má", "bố", "cha", "chó", "vãi", "gái", "cave", "cc", "lol", "ass", "dick", "cock",
];

/// Full queries that are always allowed past the context tier.
pub const SAFE_PHRASES: &[&str] = &[
    "call me maybe",
    "me and you",
    "kiss me",
    "love me like you do",
    "cho tôi xin một vé đi tuổi thơ",
    "cho em gần anh thêm chút nữa",
    "mẹ yêu con",
    "ba ngọn nến lung linh",
    "bố ơi mình đi đâu thế",
    "cha và con gái",
    "chó con",
];
