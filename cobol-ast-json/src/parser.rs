// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! COBOL front end.
//!
//! The grammar below covers the divisions, data description entries and
//! statements of a practical COBOL subset. Parsing produces the generic
//! [`ParseTree`]: pest pairs of token rules become terminal nodes, pairs
//! of parser rules become rule nodes. Rule and token numbering follows
//! the order of the [`RULE_NAMES`] and [`TOKEN_NAMES`] tables.
//!
//! Nesting depth is bounded before and during tree construction, and
//! input nested deeper than [`DEFAULT_MAX_DEPTH`] is reported as `E5`.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files;
use pest::error::InputLocation;
use pest::iterators::Pair;
use pest::Parser;

use crate::error::ErrorCode;
use crate::serializer::DEFAULT_MAX_DEPTH;
use crate::source::{normalize, SourceFormat};
use crate::tree::{
    FileId, ParseTree, RuleNode, SourceDatabase, SourceLocation, SourceRange, TerminalNode,
};

// Generate the COBOL parser.
//
// Keywords are atomic rules with a trailing word boundary check, so that
// `DISPLAY-COUNT` is read as a single user-defined word. Parser rules use
// camelCase names, token rules use uppercase names.
#[derive(pest_derive::Parser)]
#[grammar_inline = r#"
WHITESPACE = _{ " " | "\t" | NEWLINE | ("," | ";") ~ &(" " | "\t" | NEWLINE) }

// Program structure.

startRule = { SOI ~ compilationUnit ~ EOI }
compilationUnit = { programUnit+ }
programUnit = {
    identificationDivision ~
    environmentDivision? ~
    dataDivision? ~
    procedureDivision? ~
    endProgramStatement?
}
endProgramStatement = { END ~ PROGRAM ~ programName ~ DOT_FS }

identificationDivision = {
    (IDENTIFICATION | ID) ~ DIVISION ~ DOT_FS ~
    programIdParagraph ~
    identificationDivisionBody*
}
programIdParagraph = { PROGRAM_ID ~ DOT_FS ~ programName ~ DOT_FS? }
identificationDivisionBody = {
    authorParagraph |
    installationParagraph |
    dateWrittenParagraph |
    dateCompiledParagraph |
    securityParagraph |
    remarksParagraph
}
authorParagraph = { AUTHOR ~ DOT_FS ~ commentEntry? }
installationParagraph = { INSTALLATION ~ DOT_FS ~ commentEntry? }
dateWrittenParagraph = { DATE_WRITTEN ~ DOT_FS ~ commentEntry? }
dateCompiledParagraph = { DATE_COMPILED ~ DOT_FS ~ commentEntry? }
securityParagraph = { SECURITY ~ DOT_FS ~ commentEntry? }
remarksParagraph = { REMARKS ~ DOT_FS ~ commentEntry? }
commentEntry = { COMMENTENTRY+ }

environmentDivision = { ENVIRONMENT ~ DIVISION ~ DOT_FS ~ environmentDivisionBody* }
environmentDivisionBody = { configurationSection }
configurationSection = { CONFIGURATION ~ SECTION ~ DOT_FS ~ configurationSectionParagraph* }
configurationSectionParagraph = { sourceComputerParagraph | objectComputerParagraph }
sourceComputerParagraph = { SOURCE_COMPUTER ~ DOT_FS ~ (computerName ~ DOT_FS)? }
objectComputerParagraph = { OBJECT_COMPUTER ~ DOT_FS ~ (computerName ~ DOT_FS)? }

dataDivision = { DATA ~ DIVISION ~ DOT_FS ~ dataDivisionSection* }
dataDivisionSection = { workingStorageSection | localStorageSection | linkageSection }
workingStorageSection = { WORKING_STORAGE ~ SECTION ~ DOT_FS ~ dataDescriptionEntry* }
localStorageSection = { LOCAL_STORAGE ~ SECTION ~ DOT_FS ~ dataDescriptionEntry* }
linkageSection = { LINKAGE ~ SECTION ~ DOT_FS ~ dataDescriptionEntry* }
dataDescriptionEntry = { dataDescriptionEntryFormat3 | dataDescriptionEntryFormat1 }
dataDescriptionEntryFormat1 = {
    (LEVEL_NUMBER_77 | INTEGERLITERAL) ~ (FILLER | dataName)? ~
    dataDescriptionClause* ~ DOT_FS
}
dataDescriptionEntryFormat3 = { LEVEL_NUMBER_88 ~ conditionName ~ dataValueClause ~ DOT_FS }
dataDescriptionClause = {
    dataRedefinesClause |
    dataPictureClause |
    dataUsageClause |
    dataOccursClause |
    dataValueClause
}
dataRedefinesClause = { REDEFINES ~ dataName }
dataPictureClause = { (PICTURE | PIC) ~ IS? ~ pictureString }
pictureString = { PICTURESTRING }
dataUsageClause = {
    (USAGE ~ IS?)? ~
    (BINARY | COMP_3 | COMP | COMPUTATIONAL_3 | COMPUTATIONAL | DISPLAY | INDEX | PACKED_DECIMAL)
}
dataOccursClause = { OCCURS ~ integerLiteral ~ TIMES? }
dataValueClause = { (VALUES | VALUE) ~ (IS | ARE)? ~ dataValueInterval+ }
dataValueInterval = { literal ~ dataValueIntervalTo? }
dataValueIntervalTo = { (THROUGH | THRU) ~ literal }

procedureDivision = {
    PROCEDURE ~ DIVISION ~ procedureDivisionUsingClause? ~ DOT_FS ~
    procedureDivisionBody
}
procedureDivisionUsingClause = { USING ~ dataName+ }
procedureDivisionBody = { paragraphs ~ procedureSection* }
procedureSection = { procedureSectionHeader ~ DOT_FS ~ paragraphs }
procedureSectionHeader = { sectionName ~ SECTION }
paragraphs = { sentence* ~ paragraph* }
paragraph = { paragraphName ~ DOT_FS ~ sentence* }
sentence = { statement* ~ DOT_FS }

// Statements.

statement = {
    acceptStatement |
    addStatement |
    computeStatement |
    continueStatement |
    displayStatement |
    divideStatement |
    evaluateStatement |
    exitStatement |
    gobackStatement |
    goToStatement |
    ifStatement |
    initializeStatement |
    moveStatement |
    multiplyStatement |
    performStatement |
    stopStatement |
    subtractStatement
}

acceptStatement = { ACCEPT ~ identifier ~ acceptFromDateStatement? }
acceptFromDateStatement = { FROM ~ (DATE | DAY_OF_WEEK | DAY | TIME) }

addStatement = {
    ADD ~ (addToGivingStatement | addToStatement) ~
    onSizeErrorPhrase? ~ notOnSizeErrorPhrase? ~ END_ADD?
}
addToStatement = { addFrom+ ~ TO ~ addTo+ }
addToGivingStatement = { addFrom+ ~ (TO ~ addToGiving+)? ~ GIVING ~ addGiving+ }
addFrom = { literal | identifier }
addTo = { identifier ~ ROUNDED? }
addToGiving = { literal | identifier }
addGiving = { identifier ~ ROUNDED? }

computeStatement = {
    COMPUTE ~ computeStore+ ~ (EQUALCHAR | EQUAL) ~ arithmeticExpression ~
    onSizeErrorPhrase? ~ notOnSizeErrorPhrase? ~ END_COMPUTE?
}
computeStore = { identifier ~ ROUNDED? }

continueStatement = { CONTINUE }

displayStatement = { DISPLAY ~ displayOperand+ ~ displayUpon? ~ displayWith? }
displayOperand = { literal | identifier }
displayUpon = { UPON ~ mnemonicName }
displayWith = { WITH? ~ NO ~ ADVANCING }

divideStatement = {
    DIVIDE ~ (literal | identifier) ~
    (divideIntoGivingStatement | divideIntoStatement | divideByGivingStatement) ~
    divideRemainder? ~ onSizeErrorPhrase? ~ notOnSizeErrorPhrase? ~ END_DIVIDE?
}
divideIntoStatement = { INTO ~ divideInto+ }
divideIntoGivingStatement = { INTO ~ (literal | identifier) ~ divideGivingPhrase }
divideByGivingStatement = { BY ~ (literal | identifier) ~ divideGivingPhrase }
divideGivingPhrase = { GIVING ~ divideGiving+ }
divideInto = { identifier ~ ROUNDED? }
divideGiving = { identifier ~ ROUNDED? }
divideRemainder = { REMAINDER ~ identifier }

evaluateStatement = {
    EVALUATE ~ evaluateSelect ~ evaluateWhenPhrase+ ~ evaluateWhenOther? ~ END_EVALUATE?
}
evaluateSelect = {
    TRUE |
    FALSE |
    !(arithmeticExpression ~ WHEN) ~ condition |
    arithmeticExpression
}
evaluateWhenPhrase = { evaluateWhen+ ~ statement* }
evaluateWhen = { WHEN ~ evaluateCondition }
evaluateCondition = {
    TRUE |
    FALSE |
    evaluateValue ~ evaluateThrough |
    condition |
    NOT? ~ evaluateValue
}
evaluateThrough = { (THROUGH | THRU) ~ evaluateValue }
evaluateValue = { arithmeticExpression }
evaluateWhenOther = { WHEN ~ OTHER_KEYWORD ~ statement* }

exitStatement = { EXIT ~ PROGRAM? }

gobackStatement = { GOBACK }

goToStatement = { GO ~ TO? ~ procedureName }

ifStatement = { IF ~ condition ~ ifThen ~ ifElse? ~ END_IF? }
ifThen = { THEN? ~ (NEXT ~ SENTENCE | statement+) }
ifElse = { ELSE ~ (NEXT ~ SENTENCE | statement+) }

initializeStatement = { INITIALIZE ~ identifier+ }

moveStatement = { MOVE ~ ALL? ~ (moveToStatement | moveCorrespondingToStatement) }
moveToStatement = { moveToSendingArea ~ TO ~ identifier+ }
moveToSendingArea = { literal | identifier }
moveCorrespondingToStatement = { (CORRESPONDING | CORR) ~ identifier ~ TO ~ identifier+ }

multiplyStatement = {
    MULTIPLY ~ (literal | identifier) ~ BY ~ (multiplyGiving | multiplyRegular) ~
    onSizeErrorPhrase? ~ notOnSizeErrorPhrase? ~ END_MULTIPLY?
}
multiplyRegular = { multiplyRegularOperand+ }
multiplyRegularOperand = { identifier ~ ROUNDED? }
multiplyGiving = { multiplyGivingOperand ~ GIVING ~ multiplyGivingResult+ }
multiplyGivingOperand = { literal | identifier }
multiplyGivingResult = { identifier ~ ROUNDED? }

performStatement = { PERFORM ~ (performInlineStatement | performProcedureStatement) }
performInlineStatement = { performType? ~ statement* ~ END_PERFORM }
performProcedureStatement = {
    procedureName ~ ((THROUGH | THRU) ~ procedureName)? ~ performType?
}
performType = { performTimes | performUntil | performVarying }
performTimes = { (identifier | integerLiteral) ~ TIMES }
performUntil = { performTestClause? ~ UNTIL ~ condition }
performVarying = { performTestClause? ~ VARYING ~ performVaryingPhrase }
performVaryingPhrase = { (literal | identifier) ~ performFrom ~ performBy ~ performUntil }
performFrom = { FROM ~ (literal | identifier | arithmeticExpression) }
performBy = { BY ~ (literal | identifier | arithmeticExpression) }
performTestClause = { WITH? ~ TEST ~ (BEFORE | AFTER) }

stopStatement = { STOP ~ (RUN | literal) }

subtractStatement = {
    SUBTRACT ~ (subtractFromGivingStatement | subtractFromStatement) ~
    onSizeErrorPhrase? ~ notOnSizeErrorPhrase? ~ END_SUBTRACT?
}
subtractFromStatement = { subtractSubtrahend+ ~ FROM ~ subtractMinuend+ }
subtractFromGivingStatement = {
    subtractSubtrahend+ ~ FROM ~ subtractMinuendGiving ~ GIVING ~ subtractGiving+
}
subtractSubtrahend = { literal | identifier }
subtractMinuend = { identifier ~ ROUNDED? }
subtractMinuendGiving = { literal | identifier }
subtractGiving = { identifier ~ ROUNDED? }

onSizeErrorPhrase = { ON? ~ SIZE ~ ERROR ~ statement+ }
notOnSizeErrorPhrase = { NOT ~ ON? ~ SIZE ~ ERROR ~ statement+ }

// Conditions and expressions.

condition = { combinableCondition ~ andOrCondition* }
andOrCondition = { (AND | OR) ~ combinableCondition }
combinableCondition = { NOT? ~ simpleCondition }
simpleCondition = {
    LPARENCHAR ~ condition ~ RPARENCHAR |
    relationCondition |
    classCondition |
    conditionNameReference
}
relationCondition = { arithmeticExpression ~ relationalOperator ~ arithmeticExpression }
relationalOperator = {
    (IS | ARE)? ~ (
        NOT? ~ (
            GREATER ~ THAN? ~ OR ~ EQUAL ~ TO? |
            MORETHANOREQUAL |
            GREATER ~ THAN? |
            MORETHANCHAR |
            LESS ~ THAN? ~ OR ~ EQUAL ~ TO? |
            LESSTHANOREQUAL |
            LESS ~ THAN? |
            LESSTHANCHAR |
            EQUAL ~ TO? |
            EQUALCHAR
        ) |
        NOTEQUALCHAR
    )
}
classCondition = { identifier ~ IS? ~ NOT? ~ (NUMERIC | ALPHABETIC_LOWER | ALPHABETIC_UPPER) }
conditionNameReference = { qualifiedDataName }

arithmeticExpression = { multDivs ~ plusMinus* }
plusMinus = { (PLUSCHAR | MINUSCHAR) ~ multDivs }
multDivs = { powers ~ multDiv* }
multDiv = { (ASTERISKCHAR | SLASHCHAR) ~ powers }
powers = { (PLUSCHAR | MINUSCHAR)? ~ basis ~ power* }
power = { DOUBLEASTERISKCHAR ~ basis }
basis = { LPARENCHAR ~ arithmeticExpression ~ RPARENCHAR | literal | identifier }

// Names and literals.

identifier = { qualifiedDataName ~ subscripts? }
qualifiedDataName = { dataName ~ inData* }
inData = { (IN | OF) ~ dataName }
subscripts = { LPARENCHAR ~ subscript+ ~ RPARENCHAR }
subscript = { integerLiteral | qualifiedDataName }
procedureName = { paragraphName ~ inSection? }
inSection = { (IN | OF) ~ sectionName }

programName = { NONNUMERICLITERAL | cobolWord }
computerName = { cobolWord }
conditionName = { cobolWord }
dataName = { cobolWord }
mnemonicName = { cobolWord }
paragraphName = { cobolWord }
sectionName = { cobolWord }
cobolWord = { IDENTIFIER }

literal = { NONNUMERICLITERAL | figurativeConstant | numericLiteral }
numericLiteral = { NUMERICLITERAL | integerLiteral }
integerLiteral = { INTEGERLITERAL }
figurativeConstant = {
    HIGH_VALUES | HIGH_VALUE | LOW_VALUES | LOW_VALUE |
    QUOTES | QUOTE | SPACES | SPACE | ZEROES | ZEROS | ZERO
}

// Tokens.

name_char = _{ ASCII_ALPHANUMERIC | "-" | "_" }
inline_space = _{ " " | "\t" }

ACCEPT = @{ ^"ACCEPT" ~ !name_char }
ADD = @{ ^"ADD" ~ !name_char }
ADVANCING = @{ ^"ADVANCING" ~ !name_char }
AFTER = @{ ^"AFTER" ~ !name_char }
ALL = @{ ^"ALL" ~ !name_char }
ALPHABETIC_LOWER = @{ ^"ALPHABETIC-LOWER" ~ !name_char }
ALPHABETIC_UPPER = @{ ^"ALPHABETIC-UPPER" ~ !name_char }
AND = @{ ^"AND" ~ !name_char }
ARE = @{ ^"ARE" ~ !name_char }
AUTHOR = @{ ^"AUTHOR" ~ !name_char }
BEFORE = @{ ^"BEFORE" ~ !name_char }
BINARY = @{ ^"BINARY" ~ !name_char }
BY = @{ ^"BY" ~ !name_char }
COMP = @{ ^"COMP" ~ !name_char }
COMP_3 = @{ ^"COMP-3" ~ !name_char }
COMPUTATIONAL = @{ ^"COMPUTATIONAL" ~ !name_char }
COMPUTATIONAL_3 = @{ ^"COMPUTATIONAL-3" ~ !name_char }
COMPUTE = @{ ^"COMPUTE" ~ !name_char }
CONFIGURATION = @{ ^"CONFIGURATION" ~ !name_char }
CONTINUE = @{ ^"CONTINUE" ~ !name_char }
CORR = @{ ^"CORR" ~ !name_char }
CORRESPONDING = @{ ^"CORRESPONDING" ~ !name_char }
DATA = @{ ^"DATA" ~ !name_char }
DATE = @{ ^"DATE" ~ !name_char }
DATE_COMPILED = @{ ^"DATE-COMPILED" ~ !name_char }
DATE_WRITTEN = @{ ^"DATE-WRITTEN" ~ !name_char }
DAY = @{ ^"DAY" ~ !name_char }
DAY_OF_WEEK = @{ ^"DAY-OF-WEEK" ~ !name_char }
DISPLAY = @{ ^"DISPLAY" ~ !name_char }
DIVIDE = @{ ^"DIVIDE" ~ !name_char }
DIVISION = @{ ^"DIVISION" ~ !name_char }
ELSE = @{ ^"ELSE" ~ !name_char }
END = @{ ^"END" ~ !name_char }
END_ADD = @{ ^"END-ADD" ~ !name_char }
END_COMPUTE = @{ ^"END-COMPUTE" ~ !name_char }
END_DIVIDE = @{ ^"END-DIVIDE" ~ !name_char }
END_EVALUATE = @{ ^"END-EVALUATE" ~ !name_char }
END_IF = @{ ^"END-IF" ~ !name_char }
END_MULTIPLY = @{ ^"END-MULTIPLY" ~ !name_char }
END_PERFORM = @{ ^"END-PERFORM" ~ !name_char }
END_SUBTRACT = @{ ^"END-SUBTRACT" ~ !name_char }
ENVIRONMENT = @{ ^"ENVIRONMENT" ~ !name_char }
EQUAL = @{ ^"EQUAL" ~ !name_char }
ERROR = @{ ^"ERROR" ~ !name_char }
EVALUATE = @{ ^"EVALUATE" ~ !name_char }
EXIT = @{ ^"EXIT" ~ !name_char }
FALSE = @{ ^"FALSE" ~ !name_char }
FILLER = @{ ^"FILLER" ~ !name_char }
FROM = @{ ^"FROM" ~ !name_char }
GIVING = @{ ^"GIVING" ~ !name_char }
GO = @{ ^"GO" ~ !name_char }
GOBACK = @{ ^"GOBACK" ~ !name_char }
GREATER = @{ ^"GREATER" ~ !name_char }
HIGH_VALUE = @{ ^"HIGH-VALUE" ~ !name_char }
HIGH_VALUES = @{ ^"HIGH-VALUES" ~ !name_char }
ID = @{ ^"ID" ~ !name_char }
IDENTIFICATION = @{ ^"IDENTIFICATION" ~ !name_char }
IF = @{ ^"IF" ~ !name_char }
IN = @{ ^"IN" ~ !name_char }
INDEX = @{ ^"INDEX" ~ !name_char }
INITIALIZE = @{ ^"INITIALIZE" ~ !name_char }
INSTALLATION = @{ ^"INSTALLATION" ~ !name_char }
INTO = @{ ^"INTO" ~ !name_char }
IS = @{ ^"IS" ~ !name_char }
LESS = @{ ^"LESS" ~ !name_char }
LINKAGE = @{ ^"LINKAGE" ~ !name_char }
LOCAL_STORAGE = @{ ^"LOCAL-STORAGE" ~ !name_char }
LOW_VALUE = @{ ^"LOW-VALUE" ~ !name_char }
LOW_VALUES = @{ ^"LOW-VALUES" ~ !name_char }
MOVE = @{ ^"MOVE" ~ !name_char }
MULTIPLY = @{ ^"MULTIPLY" ~ !name_char }
NEXT = @{ ^"NEXT" ~ !name_char }
NO = @{ ^"NO" ~ !name_char }
NOT = @{ ^"NOT" ~ !name_char }
NUMERIC = @{ ^"NUMERIC" ~ !name_char }
OBJECT_COMPUTER = @{ ^"OBJECT-COMPUTER" ~ !name_char }
OCCURS = @{ ^"OCCURS" ~ !name_char }
OF = @{ ^"OF" ~ !name_char }
ON = @{ ^"ON" ~ !name_char }
OR = @{ ^"OR" ~ !name_char }
OTHER_KEYWORD = @{ ^"OTHER" ~ !name_char }
PACKED_DECIMAL = @{ ^"PACKED-DECIMAL" ~ !name_char }
PERFORM = @{ ^"PERFORM" ~ !name_char }
PIC = @{ ^"PIC" ~ !name_char }
PICTURE = @{ ^"PICTURE" ~ !name_char }
PROCEDURE = @{ ^"PROCEDURE" ~ !name_char }
PROGRAM = @{ ^"PROGRAM" ~ !name_char }
PROGRAM_ID = @{ ^"PROGRAM-ID" ~ !name_char }
QUOTE = @{ ^"QUOTE" ~ !name_char }
QUOTES = @{ ^"QUOTES" ~ !name_char }
REDEFINES = @{ ^"REDEFINES" ~ !name_char }
REMAINDER = @{ ^"REMAINDER" ~ !name_char }
REMARKS = @{ ^"REMARKS" ~ !name_char }
ROUNDED = @{ ^"ROUNDED" ~ !name_char }
RUN = @{ ^"RUN" ~ !name_char }
SECTION = @{ ^"SECTION" ~ !name_char }
SECURITY = @{ ^"SECURITY" ~ !name_char }
SENTENCE = @{ ^"SENTENCE" ~ !name_char }
SIZE = @{ ^"SIZE" ~ !name_char }
SOURCE_COMPUTER = @{ ^"SOURCE-COMPUTER" ~ !name_char }
SPACE = @{ ^"SPACE" ~ !name_char }
SPACES = @{ ^"SPACES" ~ !name_char }
STOP = @{ ^"STOP" ~ !name_char }
SUBTRACT = @{ ^"SUBTRACT" ~ !name_char }
TEST = @{ ^"TEST" ~ !name_char }
THAN = @{ ^"THAN" ~ !name_char }
THEN = @{ ^"THEN" ~ !name_char }
THROUGH = @{ ^"THROUGH" ~ !name_char }
THRU = @{ ^"THRU" ~ !name_char }
TIME = @{ ^"TIME" ~ !name_char }
TIMES = @{ ^"TIMES" ~ !name_char }
TO = @{ ^"TO" ~ !name_char }
TRUE = @{ ^"TRUE" ~ !name_char }
UNTIL = @{ ^"UNTIL" ~ !name_char }
UPON = @{ ^"UPON" ~ !name_char }
USAGE = @{ ^"USAGE" ~ !name_char }
USING = @{ ^"USING" ~ !name_char }
VALUE = @{ ^"VALUE" ~ !name_char }
VALUES = @{ ^"VALUES" ~ !name_char }
VARYING = @{ ^"VARYING" ~ !name_char }
WHEN = @{ ^"WHEN" ~ !name_char }
WITH = @{ ^"WITH" ~ !name_char }
WORKING_STORAGE = @{ ^"WORKING-STORAGE" ~ !name_char }
ZERO = @{ ^"ZERO" ~ !name_char }
ZEROES = @{ ^"ZEROES" ~ !name_char }
ZEROS = @{ ^"ZEROS" ~ !name_char }

reserved_word = _{
    ACCEPT | ADD | ADVANCING | AFTER | ALL | ALPHABETIC_LOWER | ALPHABETIC_UPPER | AND | ARE |
    AUTHOR | BEFORE | BINARY | BY | COMP | COMP_3 | COMPUTATIONAL | COMPUTATIONAL_3 | COMPUTE |
    CONFIGURATION | CONTINUE | CORR | CORRESPONDING | DATA | DATE | DATE_COMPILED |
    DATE_WRITTEN | DAY | DAY_OF_WEEK | DISPLAY | DIVIDE | DIVISION | ELSE | END | END_ADD |
    END_COMPUTE | END_DIVIDE | END_EVALUATE | END_IF | END_MULTIPLY | END_PERFORM |
    END_SUBTRACT | ENVIRONMENT | EQUAL | ERROR | EVALUATE | EXIT | FALSE | FILLER | FROM |
    GIVING | GO | GOBACK | GREATER | HIGH_VALUE | HIGH_VALUES | ID | IDENTIFICATION | IF | IN |
    INDEX | INITIALIZE | INSTALLATION | INTO | IS | LESS | LINKAGE | LOCAL_STORAGE | LOW_VALUE |
    LOW_VALUES | MOVE | MULTIPLY | NEXT | NO | NOT | NUMERIC | OBJECT_COMPUTER | OCCURS | OF |
    ON | OR | OTHER_KEYWORD | PACKED_DECIMAL | PERFORM | PIC | PICTURE | PROCEDURE | PROGRAM |
    PROGRAM_ID | QUOTE | QUOTES | REDEFINES | REMAINDER | REMARKS | ROUNDED | RUN | SECTION |
    SECURITY | SENTENCE | SIZE | SOURCE_COMPUTER | SPACE | SPACES | STOP | SUBTRACT | TEST |
    THAN | THEN | THROUGH | THRU | TIME | TIMES | TO | TRUE | UNTIL | UPON | USAGE | USING |
    VALUE | VALUES | VARYING | WHEN | WITH | WORKING_STORAGE | ZERO | ZEROES | ZEROS
}

comment_entry_end = _{
    (AUTHOR | INSTALLATION | DATE_WRITTEN | DATE_COMPILED | SECURITY | REMARKS | PROGRAM_ID) ~
        inline_space* ~ "." |
    (ENVIRONMENT | DATA | PROCEDURE) ~ inline_space+ ~ DIVISION |
    END ~ inline_space+ ~ PROGRAM
}
COMMENTENTRY = @{
    !comment_entry_end ~ (!(inline_space* ~ (NEWLINE | EOI)) ~ ANY)+
}

IDENTIFIER = @{
    !reserved_word ~
    (ASCII_DIGIT+ ~ ("-" | "_")*)? ~
    ASCII_ALPHA ~ ASCII_ALPHANUMERIC* ~
    (("-" | "_")+ ~ ASCII_ALPHANUMERIC+)*
}
NONNUMERICLITERAL = @{
    "\"" ~ ("\"\"" | !("\"" | NEWLINE) ~ ANY)* ~ "\"" |
    "'" ~ ("''" | !("'" | NEWLINE) ~ ANY)* ~ "'"
}
NUMERICLITERAL = @{
    ("+" | "-")? ~ ASCII_DIGIT* ~ "." ~ ASCII_DIGIT+ |
    ("+" | "-") ~ ASCII_DIGIT+
}
INTEGERLITERAL = @{ ASCII_DIGIT+ ~ !(ASCII_ALPHA | "_" | "-" ~ ASCII_ALPHANUMERIC) }
LEVEL_NUMBER_77 = @{ "77" ~ !ASCII_DIGIT }
LEVEL_NUMBER_88 = @{ "88" ~ !ASCII_DIGIT }

picture_symbol = _{ ASCII_ALPHANUMERIC | "(" | "+" | "-" | "$" | "*" | "/" }
picture_char = _{
    "(" ~ ASCII_DIGIT+ ~ ")" |
    ASCII_ALPHANUMERIC | "+" | "-" | "$" | "*" | "/" |
    ("," | ".") ~ &picture_symbol
}
PICTURESTRING = @{ picture_char+ }

DOT_FS = @{ "." }
LPARENCHAR = @{ "(" }
RPARENCHAR = @{ ")" }
PLUSCHAR = @{ "+" }
MINUSCHAR = @{ "-" }
DOUBLEASTERISKCHAR = @{ "**" }
ASTERISKCHAR = @{ "*" ~ !"*" }
SLASHCHAR = @{ "/" }
EQUALCHAR = @{ "=" }
NOTEQUALCHAR = @{ "<>" }
LESSTHANOREQUAL = @{ "<=" }
LESSTHANCHAR = @{ "<" }
MORETHANOREQUAL = @{ ">=" }
MORETHANCHAR = @{ ">" }
"#]
pub struct CobolParser;

/// Token type of the end of input terminal.
pub const EOF: i32 = -1;

macro_rules! symbol_tables {
    (rules: [$($rule:ident),* $(,)?], tokens: [$($token:ident),* $(,)?] $(,)?) => {
        /// Parser rule names, indexed by rule index.
        pub const RULE_NAMES: &[&str] = &[$(stringify!($rule)),*];

        /// Token names, indexed by token type.
        /// Token type `0` is never produced.
        pub const TOKEN_NAMES: &[&str] = &["<INVALID>", $(stringify!($token)),*];

        const RULES: &[Rule] = &[$(Rule::$rule),*];
        const TOKENS: &[Rule] = &[$(Rule::$token),*];
    };
}

symbol_tables! {
    rules: [
        startRule, compilationUnit, programUnit, endProgramStatement, identificationDivision,
        programIdParagraph, identificationDivisionBody, authorParagraph, installationParagraph,
        dateWrittenParagraph, dateCompiledParagraph, securityParagraph, remarksParagraph,
        commentEntry, environmentDivision, environmentDivisionBody, configurationSection,
        configurationSectionParagraph, sourceComputerParagraph, objectComputerParagraph,
        dataDivision, dataDivisionSection, workingStorageSection, localStorageSection,
        linkageSection, dataDescriptionEntry, dataDescriptionEntryFormat1,
        dataDescriptionEntryFormat3, dataDescriptionClause, dataRedefinesClause, dataPictureClause,
        pictureString, dataUsageClause, dataOccursClause, dataValueClause, dataValueInterval,
        dataValueIntervalTo, procedureDivision, procedureDivisionUsingClause, procedureDivisionBody,
        procedureSection, procedureSectionHeader, paragraphs, paragraph, sentence, statement,
        acceptStatement, acceptFromDateStatement, addStatement, addToStatement,
        addToGivingStatement, addFrom, addTo, addToGiving, addGiving, computeStatement,
        computeStore, continueStatement, displayStatement, displayOperand, displayUpon, displayWith,
        divideStatement, divideIntoStatement, divideIntoGivingStatement, divideByGivingStatement,
        divideGivingPhrase, divideInto, divideGiving, divideRemainder, evaluateStatement,
        evaluateSelect, evaluateWhenPhrase, evaluateWhen, evaluateCondition, evaluateThrough,
        evaluateValue, evaluateWhenOther, exitStatement, gobackStatement, goToStatement,
        ifStatement, ifThen, ifElse, initializeStatement, moveStatement, moveToStatement,
        moveToSendingArea, moveCorrespondingToStatement, multiplyStatement, multiplyRegular,
        multiplyRegularOperand, multiplyGiving, multiplyGivingOperand, multiplyGivingResult,
        performStatement, performInlineStatement, performProcedureStatement, performType,
        performTimes, performUntil, performVarying, performVaryingPhrase, performFrom, performBy,
        performTestClause, stopStatement, subtractStatement, subtractFromStatement,
        subtractFromGivingStatement, subtractSubtrahend, subtractMinuend, subtractMinuendGiving,
        subtractGiving, onSizeErrorPhrase, notOnSizeErrorPhrase, condition, andOrCondition,
        combinableCondition, simpleCondition, relationCondition, relationalOperator, classCondition,
        conditionNameReference, arithmeticExpression, plusMinus, multDivs, multDiv, powers, power,
        basis, identifier, qualifiedDataName, inData, subscripts, subscript, procedureName,
        inSection, programName, computerName, conditionName, dataName, mnemonicName, paragraphName,
        sectionName, cobolWord, literal, numericLiteral, integerLiteral, figurativeConstant,
    ],
    tokens: [
        ACCEPT, ADD, ADVANCING, AFTER, ALL, ALPHABETIC_LOWER, ALPHABETIC_UPPER, AND, ARE, AUTHOR,
        BEFORE, BINARY, BY, COMP, COMP_3, COMPUTATIONAL, COMPUTATIONAL_3, COMPUTE, CONFIGURATION,
        CONTINUE, CORR, CORRESPONDING, DATA, DATE, DATE_COMPILED, DATE_WRITTEN, DAY, DAY_OF_WEEK,
        DISPLAY, DIVIDE, DIVISION, ELSE, END, END_ADD, END_COMPUTE, END_DIVIDE, END_EVALUATE,
        END_IF, END_MULTIPLY, END_PERFORM, END_SUBTRACT, ENVIRONMENT, EQUAL, ERROR, EVALUATE, EXIT,
        FALSE, FILLER, FROM, GIVING, GO, GOBACK, GREATER, HIGH_VALUE, HIGH_VALUES, ID,
        IDENTIFICATION, IF, IN, INDEX, INITIALIZE, INSTALLATION, INTO, IS, LESS, LINKAGE,
        LOCAL_STORAGE, LOW_VALUE, LOW_VALUES, MOVE, MULTIPLY, NEXT, NO, NOT, NUMERIC,
        OBJECT_COMPUTER, OCCURS, OF, ON, OR, OTHER_KEYWORD, PACKED_DECIMAL, PERFORM, PIC, PICTURE,
        PROCEDURE, PROGRAM, PROGRAM_ID, QUOTE, QUOTES, REDEFINES, REMAINDER, REMARKS, ROUNDED, RUN,
        SECTION, SECURITY, SENTENCE, SIZE, SOURCE_COMPUTER, SPACE, SPACES, STOP, SUBTRACT, TEST,
        THAN, THEN, THROUGH, THRU, TIME, TIMES, TO, TRUE, UNTIL, UPON, USAGE, USING, VALUE, VALUES,
        VARYING, WHEN, WITH, WORKING_STORAGE, ZERO, ZEROES, ZEROS, COMMENTENTRY, IDENTIFIER,
        NONNUMERICLITERAL, NUMERICLITERAL, INTEGERLITERAL, LEVEL_NUMBER_77, LEVEL_NUMBER_88,
        PICTURESTRING, DOT_FS, LPARENCHAR, RPARENCHAR, PLUSCHAR, MINUSCHAR, DOUBLEASTERISKCHAR,
        ASTERISKCHAR, SLASHCHAR, EQUALCHAR, NOTEQUALCHAR, LESSTHANOREQUAL, LESSTHANCHAR,
        MORETHANOREQUAL, MORETHANCHAR,
    ],
}

/// Return the name of the token type `symbol`.
pub fn token_name(symbol: i32) -> Option<&'static str> {
    if symbol == EOF {
        return Some("EOF");
    }
    match usize::try_from(symbol) {
        Ok(index) if index > 0 => TOKEN_NAMES.get(index).copied(),
        _ => None,
    }
}

type Node<'i> = Pair<'i, Rule>;

/// Stack size of the parser thread. Nesting is bounded by
/// [`check_nesting`] before parsing, and the stack must hold the
/// recursive descent for that many levels in unoptimized builds too.
const PARSER_STACK_SIZE: usize = 64 * 1024 * 1024;

struct Context<'a> {
    file: FileId,
    line_starts: &'a Vec<usize>,
    max_depth: usize,
}

trait Helpers<'i> {
    fn as_loc(&self, context: &Context) -> SourceRange;
    fn as_string(&self) -> String;
}

impl<'i> Helpers<'i> for Node<'i> {
    fn as_loc(&self, context: &Context) -> SourceRange {
        let span = self.as_span();
        SourceRange {
            file: context.file,
            start: SourceLocation::new(span.start_pos().pos(), context.line_starts),
            end: SourceLocation::new(span.end_pos().pos(), context.line_starts),
        }
    }

    fn as_string(&self) -> String {
        self.as_str().to_owned()
    }
}

enum Symbol {
    Token(i32),
    Rule(usize),
}

fn classify(rule: Rule) -> Option<Symbol> {
    if rule == Rule::EOI {
        return Some(Symbol::Token(EOF));
    }
    if let Some(index) = TOKENS.iter().position(|token| *token == rule) {
        return Some(Symbol::Token(index as i32 + 1));
    }
    RULES.iter().position(|r| *r == rule).map(Symbol::Rule)
}

fn err_malformed_tree(loc: &SourceRange, message: String) -> Diagnostic<FileId> {
    Diagnostic::error()
        .with_code(ErrorCode::MalformedTree)
        .with_message(message)
        .with_labels(vec![loc.primary()])
}

fn build_tree(
    node: Node<'_>,
    context: &Context,
    depth: usize,
) -> Result<ParseTree, Diagnostic<FileId>> {
    let loc = node.as_loc(context);
    if depth > context.max_depth {
        return Err(Diagnostic::error()
            .with_code(ErrorCode::DepthLimitExceeded)
            .with_message(format!(
                "parse tree exceeds the maximum depth of {} nodes",
                context.max_depth
            ))
            .with_labels(vec![loc.primary()]));
    }
    match classify(node.as_rule()) {
        Some(Symbol::Token(symbol)) => {
            if let Some(inner) = node.clone().into_inner().next() {
                return Err(err_malformed_tree(
                    &loc,
                    format!("token {:?} contains rule {:?}", node.as_rule(), inner.as_rule()),
                ));
            }
            let text = if symbol == EOF { "<EOF>".to_owned() } else { node.as_string() };
            Ok(ParseTree::Terminal(TerminalNode { loc, text, symbol }))
        }
        Some(Symbol::Rule(rule_index)) => {
            let text = node.as_string();
            let children = node
                .into_inner()
                .map(|child| build_tree(child, context, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ParseTree::Rule(RuleNode { loc, rule_index, text, children }))
        }
        None => Err(err_malformed_tree(
            &loc,
            format!("rule {:?} is neither a parser rule nor a token", node.as_rule()),
        )),
    }
}

/// Constructs open at a point of the program text.
#[derive(Default)]
struct Nesting {
    parens: usize,
    ifs: usize,
    evaluates: usize,
    performs: usize,
    size_phrases: usize,
}

impl Nesting {
    fn depth(&self) -> usize {
        self.parens + self.ifs + self.evaluates + self.performs + self.size_phrases
    }

    fn word(&mut self, word: &str) {
        match word.to_ascii_uppercase().as_str() {
            "IF" => self.ifs += 1,
            "END-IF" => self.ifs = self.ifs.saturating_sub(1),
            "EVALUATE" => self.evaluates += 1,
            "END-EVALUATE" => self.evaluates = self.evaluates.saturating_sub(1),
            "PERFORM" => self.performs += 1,
            "END-PERFORM" => self.performs = self.performs.saturating_sub(1),
            // Size error phrases stay open until the end of the sentence.
            "SIZE" => self.size_phrases += 1,
            _ => (),
        }
    }
}

fn is_name_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_'
}

/// Reject program text nesting parenthesized expressions and statements
/// deeper than `max_depth`, before the recursive descent parser runs.
///
/// Every open construct adds at least one level to the parse tree, so no
/// tree within the depth limit is rejected here. A separator period
/// closes all open statements.
fn check_nesting(
    file: FileId,
    name: &str,
    program_text: &str,
    max_depth: usize,
) -> Result<(), Diagnostic<FileId>> {
    let text = program_text.as_bytes();
    let mut nesting = Nesting::default();
    let mut pos = 0;
    while pos < text.len() {
        let start = pos;
        match text[pos] {
            quote @ (b'"' | b'\'') => {
                pos += 1;
                while pos < text.len() && text[pos] != quote && text[pos] != b'\n' {
                    pos += 1;
                }
            }
            b'(' => nesting.parens += 1,
            b')' => nesting.parens = nesting.parens.saturating_sub(1),
            b'.' if text.get(pos + 1).map_or(true, u8::is_ascii_whitespace) => {
                nesting = Nesting::default()
            }
            c if c.is_ascii_alphanumeric() => {
                while text.get(pos + 1).map_or(false, |c| is_name_byte(*c)) {
                    pos += 1;
                }
                nesting.word(&program_text[start..=pos]);
            }
            _ => (),
        }
        if nesting.depth() > max_depth {
            return Err(Diagnostic::error()
                .with_code(ErrorCode::DepthLimitExceeded)
                .with_message(format!(
                    "input file '{}' exceeds the maximum nesting depth of {}",
                    name, max_depth
                ))
                .with_labels(vec![
                    Label::primary(file, start..pos + 1).with_message("nested too deeply")
                ]));
        }
        pos += 1;
    }
    Ok(())
}

fn err_syntax(file: FileId, name: &str, err: pest::error::Error<Rule>) -> Diagnostic<FileId> {
    let range = match err.location {
        InputLocation::Pos(pos) => pos..pos,
        InputLocation::Span((start, end)) => start..end,
    };
    Diagnostic::error()
        .with_code(ErrorCode::GrammarParse)
        .with_message(format!("failed to parse input file '{}'", name))
        .with_labels(vec![Label::primary(file, range).with_message(err.variant.message())])
}

/// Parse COBOL source code from a string, in the given reference format.
///
/// The original source is added to the source database under the
/// provided name, and node locations refer to it.
pub fn parse_inline_with_format(
    sources: &mut SourceDatabase,
    name: &str,
    source: String,
    format: SourceFormat,
) -> Result<ParseTree, Diagnostic<FileId>> {
    let program_text = normalize(&source, format);
    let line_starts: Vec<_> = files::line_starts(&source).collect();
    let file = sources.add(name.to_owned(), source);
    check_nesting(file, name, &program_text, DEFAULT_MAX_DEPTH)?;
    let context = Context { file, line_starts: &line_starts, max_depth: DEFAULT_MAX_DEPTH };
    let parse = || parse_program(name, &program_text, &context);
    std::thread::scope(|scope| {
        let worker = std::thread::Builder::new()
            .name("cobol-parser".to_owned())
            .stack_size(PARSER_STACK_SIZE)
            .spawn_scoped(scope, parse);
        match worker {
            Ok(worker) => worker.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
            Err(_) => parse(),
        }
    })
}

fn parse_program(
    name: &str,
    program_text: &str,
    context: &Context,
) -> Result<ParseTree, Diagnostic<FileId>> {
    let root = CobolParser::parse(Rule::startRule, program_text)
        .map_err(|err| err_syntax(context.file, name, err))?
        .next()
        .ok_or_else(|| {
            Diagnostic::error()
                .with_code(ErrorCode::MalformedTree)
                .with_message(format!("no parse tree for input file '{}'", name))
        })?;
    build_tree(root, context, 1)
}

/// Parse COBOL source code from a string.
///
/// The reference format is detected from the layout of the source.
pub fn parse_inline(
    sources: &mut SourceDatabase,
    name: &str,
    source: String,
) -> Result<ParseTree, Diagnostic<FileId>> {
    let format = SourceFormat::detect(&source);
    parse_inline_with_format(sources, name, source, format)
}

/// Parse a new source file.
///
/// The source file is fully read and added to the source database.
/// Returns the parse tree, or a descriptive diagnostic in case of read
/// or syntax error.
pub fn parse_file(
    sources: &mut SourceDatabase,
    name: &str,
) -> Result<ParseTree, Diagnostic<FileId>> {
    let source = std::fs::read_to_string(name).map_err(|e| {
        Diagnostic::error()
            .with_code(ErrorCode::FileRead)
            .with_message(format!("failed to read input file '{}': {}", name, e))
    })?;
    parse_inline(sources, name, source)
}
