use std::collections::HashSet;

#[rustfmt::skip::macros(lazy_static)]
lazy_static! {
    /// Reserved in SQL:2016 and rejected as bare identifiers by every supported engine.
    pub static ref ANSI_RESERVED: HashSet<&'static str> = [
        "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CAST", "CHECK",
        "COLUMN", "CONSTRAINT", "CREATE", "CROSS", "CURRENT", "CURRENT_DATE", "CURRENT_TIME",
        "CURRENT_TIMESTAMP", "CURRENT_USER", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP",
        "ELSE", "END", "EXCEPT", "EXISTS", "FALSE", "FETCH", "FOR", "FOREIGN", "FROM", "FULL",
        "GRANT", "GROUP", "HAVING", "IN", "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN",
        "LATERAL", "LEFT", "LIKE", "NATURAL", "NOT", "NULL", "OF", "OFFSET", "ON", "OR",
        "ORDER", "OUTER", "PRIMARY", "REFERENCES", "RIGHT", "ROW", "ROWS", "SELECT", "SET",
        "SOME", "TABLE", "THEN", "TO", "TRUE", "UNION", "UNIQUE", "UPDATE", "USER", "USING",
        "VALUES", "WHEN", "WHERE", "WINDOW", "WITH",
    ]
    .into_iter()
    .collect();

    pub static ref POSTGRES_RESERVED: HashSet<&'static str> = [
        "ANALYSE", "ANALYZE", "ARRAY", "ASYMMETRIC", "BOTH", "COLLATE", "DEFERRABLE", "DO",
        "LEADING", "LIMIT", "LOCALTIME", "LOCALTIMESTAMP", "ONLY", "PLACING", "RETURNING",
        "SYMMETRIC", "TRAILING", "VARIADIC",
    ]
    .into_iter()
    .collect();

    pub static ref SQLSERVER_RESERVED: HashSet<&'static str> = [
        "BACKUP", "BREAK", "BROWSE", "BULK", "CLUSTERED", "COMPUTE", "CONTAINS",
        "CONTAINSTABLE", "DATABASE", "DBCC", "DENY", "DISK", "DUMP", "ERRLVL", "EXEC",
        "EXECUTE", "FILE", "FILLFACTOR", "FREETEXT", "FREETEXTTABLE", "GOTO", "HOLDLOCK",
        "IDENTITY", "IDENTITYCOL", "INDEX", "KEY", "KILL", "LINENO", "LOAD", "NOCHECK",
        "NONCLUSTERED", "OPENQUERY", "OPENROWSET", "PERCENT", "PIVOT", "PLAN", "PRINT", "PROC",
        "PROCEDURE", "PUBLIC", "RAISERROR", "READTEXT", "RULE", "SAVE", "SCHEMA", "SHUTDOWN",
        "STATISTICS", "TEXTSIZE", "TOP", "TRAN", "TRANSACTION", "TRIGGER", "TRUNCATE",
        "TSEQUAL", "UNPIVOT", "UPDATETEXT", "USE", "VIEW", "WAITFOR", "WHILE", "WRITETEXT",
    ]
    .into_iter()
    .collect();

    pub static ref MYSQL_RESERVED: HashSet<&'static str> = [
        "ACCESSIBLE", "CHANGE", "DATABASE", "DATABASES", "DENSE_RANK", "DIV", "DUAL",
        "EXPLAIN", "FIRST_VALUE", "FULLTEXT", "GROUPS", "IGNORE", "INDEX", "INTERVAL", "KEY",
        "KEYS", "KILL", "LAG", "LAST_VALUE", "LEAD", "LIMIT", "LINES", "LOAD", "LOCK", "MATCH",
        "MOD", "OPTIMIZE", "OPTION", "OUTFILE", "RANGE", "RANK", "READ", "REGEXP", "RENAME",
        "REPLACE", "REQUIRE", "RLIKE", "ROW_NUMBER", "SCHEMA", "SHOW", "SPATIAL", "SQL",
        "STARTING", "STRAIGHT_JOIN", "SYSTEM", "TERMINATED", "UNLOCK", "UNSIGNED", "USAGE",
        "WRITE", "XOR", "ZEROFILL",
    ]
    .into_iter()
    .collect();

    pub static ref SQLITE_RESERVED: HashSet<&'static str> = [
        "ABORT", "AUTOINCREMENT", "COLLATE", "DEFERRABLE", "ESCAPE", "GLOB", "INDEX",
        "INDEXED", "ISNULL", "LIMIT", "NOTNULL", "PRAGMA", "RAISE", "REGEXP", "TRANSACTION",
        "VACUUM",
    ]
    .into_iter()
    .collect();

    pub static ref ORACLE_RESERVED: HashSet<&'static str> = [
        "ACCESS", "AUDIT", "CLUSTER", "COMMENT", "COMPRESS", "CONNECT", "DATE", "DECIMAL",
        "EXCLUSIVE", "FILE", "FLOAT", "IDENTIFIED", "IMMEDIATE", "INCREMENT", "INDEX",
        "INITIAL", "INTEGER", "LEVEL", "LOCK", "LONG", "MAXEXTENTS", "MINUS", "MLSLABEL",
        "MODE", "MODIFY", "NOAUDIT", "NOCOMPRESS", "NOWAIT", "NUMBER", "OFFLINE", "ONLINE",
        "OPTION", "PCTFREE", "PRIOR", "PUBLIC", "RAW", "RENAME", "RESOURCE", "ROWID", "ROWNUM",
        "SESSION", "SHARE", "SIZE", "SMALLINT", "START", "SUCCESSFUL", "SYNONYM", "SYSDATE",
        "UID", "VALIDATE", "VARCHAR", "VARCHAR2", "VIEW",
    ]
    .into_iter()
    .collect();
}

/// Tests whether `name` can be written without quotes: a letter or underscore followed by
/// letters, digits and underscores.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_identifier() {
        assert!(is_plain_identifier("customer_id"));
        assert!(is_plain_identifier("_c0"));
        assert!(!is_plain_identifier("0c"));
        assert!(!is_plain_identifier("order date"));
        assert!(!is_plain_identifier(""));
    }
}
