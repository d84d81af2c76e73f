//! Platform names that resolve without an import.

use crate::model::ElementKind;

/// QN and kind of a name that is implicitly visible in every Java file.
pub fn builtin(name: &str) -> Option<(&'static str, ElementKind)> {
    use ElementKind::{AnnotationType, Class, Enum, Interface};
    let found = match name {
        // java.lang
        "String" => ("java.lang.String", Class),
        "Object" => ("java.lang.Object", Class),
        "System" => ("java.lang.System", Class),
        "Integer" => ("java.lang.Integer", Class),
        "Long" => ("java.lang.Long", Class),
        "Double" => ("java.lang.Double", Class),
        "Float" => ("java.lang.Float", Class),
        "Boolean" => ("java.lang.Boolean", Class),
        "Byte" => ("java.lang.Byte", Class),
        "Character" => ("java.lang.Character", Class),
        "Short" => ("java.lang.Short", Class),
        "Void" => ("java.lang.Void", Class),
        "Number" => ("java.lang.Number", Class),
        "Math" => ("java.lang.Math", Class),
        "Class" => ("java.lang.Class", Class),
        "ClassLoader" => ("java.lang.ClassLoader", Class),
        "Thread" => ("java.lang.Thread", Class),
        "ThreadLocal" => ("java.lang.ThreadLocal", Class),
        "StringBuilder" => ("java.lang.StringBuilder", Class),
        "StringBuffer" => ("java.lang.StringBuffer", Class),
        "Enum" => ("java.lang.Enum", Class),
        "Record" => ("java.lang.Record", Class),
        "Throwable" => ("java.lang.Throwable", Class),
        "Exception" => ("java.lang.Exception", Class),
        "RuntimeException" => ("java.lang.RuntimeException", Class),
        "Error" => ("java.lang.Error", Class),
        "Iterable" => ("java.lang.Iterable", Interface),
        "AutoCloseable" => ("java.lang.AutoCloseable", Interface),
        "Runnable" => ("java.lang.Runnable", Interface),
        "Comparable" => ("java.lang.Comparable", Interface),
        "CharSequence" => ("java.lang.CharSequence", Interface),
        "Override" => ("java.lang.Override", AnnotationType),
        "Deprecated" => ("java.lang.Deprecated", AnnotationType),
        "SuppressWarnings" => ("java.lang.SuppressWarnings", AnnotationType),
        "SafeVarargs" => ("java.lang.SafeVarargs", AnnotationType),
        "FunctionalInterface" => ("java.lang.FunctionalInterface", AnnotationType),
        // common exceptions
        "NullPointerException" => ("java.lang.NullPointerException", Class),
        "IllegalArgumentException" => ("java.lang.IllegalArgumentException", Class),
        "IllegalStateException" => ("java.lang.IllegalStateException", Class),
        "IndexOutOfBoundsException" => ("java.lang.IndexOutOfBoundsException", Class),
        "UnsupportedOperationException" => ("java.lang.UnsupportedOperationException", Class),
        "InterruptedException" => ("java.lang.InterruptedException", Class),
        // java.lang.annotation
        "Retention" => ("java.lang.annotation.Retention", AnnotationType),
        "Target" => ("java.lang.annotation.Target", AnnotationType),
        "Documented" => ("java.lang.annotation.Documented", AnnotationType),
        "Inherited" => ("java.lang.annotation.Inherited", AnnotationType),
        "Repeatable" => ("java.lang.annotation.Repeatable", AnnotationType),
        "RetentionPolicy" => ("java.lang.annotation.RetentionPolicy", Enum),
        "ElementType" => ("java.lang.annotation.ElementType", Enum),
        _ => return None,
    };
    Some(found)
}

/// Primitive type names, including `void` and `var`.
pub fn is_primitive(name: &str) -> bool {
    matches!(
        name,
        "boolean" | "byte" | "char" | "short" | "int" | "long" | "float" | "double" | "void" | "var"
    )
}

/// Reserved words and literals that never name a symbol.
pub fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "abstract"
            | "assert"
            | "boolean"
            | "break"
            | "byte"
            | "case"
            | "catch"
            | "char"
            | "class"
            | "const"
            | "continue"
            | "default"
            | "do"
            | "double"
            | "else"
            | "enum"
            | "extends"
            | "final"
            | "finally"
            | "float"
            | "for"
            | "goto"
            | "if"
            | "implements"
            | "import"
            | "instanceof"
            | "int"
            | "interface"
            | "long"
            | "native"
            | "new"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "return"
            | "short"
            | "static"
            | "strictfp"
            | "super"
            | "switch"
            | "synchronized"
            | "this"
            | "throw"
            | "throws"
            | "transient"
            | "try"
            | "void"
            | "volatile"
            | "while"
            | "var"
            | "yield"
            | "record"
            | "true"
            | "false"
            | "null"
    )
}
