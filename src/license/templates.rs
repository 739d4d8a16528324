/// Key phrases of a license text, in the order they appear.
pub struct LicenseTemplate {
    pub id: &'static str,
    pub phrases: &'static [&'static str],
    /// Phrases that must not occur inside a match, telling apart licenses
    /// whose text is a subset of another's.
    pub excludes: &'static [&'static str],
}

const BSD_PREAMBLE: &str = "Redistribution and use in source and binary forms, with or without \
    modification, are permitted provided that the following conditions are met";
const BSD_SOURCE_CLAUSE: &str = "Redistributions of source code must retain the above copyright notice";
const BSD_BINARY_CLAUSE: &str = "Redistributions in binary form must reproduce the above copyright notice";
const BSD_ENDORSEMENT_CLAUSE: &str = "may be used to endorse or promote products derived from this software";
const BSD_DISCLAIMER: &str =
    "IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE DISCLAIMED";
const BSD_END: &str = "EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.";

const ISC_GRANT: &str =
    "distribute this software for any purpose with or without fee is hereby granted";
const ISC_NOTICE: &str =
    "provided that the above copyright notice and this permission notice appear in all copies";
const ISC_DISCLAIMER: &str = "DISCLAIMS ALL WARRANTIES WITH REGARD TO THIS SOFTWARE";
const ISC_END: &str =
    "ARISING OUT OF OR IN CONNECTION WITH THE USE OR PERFORMANCE OF THIS SOFTWARE.";

pub const TEMPLATES: &[LicenseTemplate] = &[
    LicenseTemplate {
        id: "MIT",
        phrases: &[
            "Permission is hereby granted, free of charge, to any person obtaining a copy of \
             this software",
            "The above copyright notice and this permission notice shall be included in all \
             copies or substantial portions of the Software.",
            "THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED",
            "OTHER DEALINGS IN THE SOFTWARE.",
        ],
        excludes: &[],
    },
    LicenseTemplate {
        id: "ISC",
        phrases: &[ISC_GRANT, ISC_NOTICE, ISC_DISCLAIMER, ISC_END],
        excludes: &[],
    },
    LicenseTemplate {
        id: "0BSD",
        phrases: &[ISC_GRANT, ISC_DISCLAIMER, ISC_END],
        excludes: &[ISC_NOTICE],
    },
    LicenseTemplate {
        id: "BSD-2-Clause",
        phrases: &[
            BSD_PREAMBLE,
            BSD_SOURCE_CLAUSE,
            BSD_BINARY_CLAUSE,
            BSD_DISCLAIMER,
            BSD_END,
        ],
        excludes: &[BSD_ENDORSEMENT_CLAUSE],
    },
    LicenseTemplate {
        id: "BSD-3-Clause",
        phrases: &[
            BSD_PREAMBLE,
            BSD_SOURCE_CLAUSE,
            BSD_BINARY_CLAUSE,
            BSD_ENDORSEMENT_CLAUSE,
            BSD_DISCLAIMER,
            BSD_END,
        ],
        excludes: &[],
    },
    LicenseTemplate {
        id: "Apache-2.0",
        phrases: &[
            "Apache License Version 2.0, January 2004",
            "TERMS AND CONDITIONS FOR USE, REPRODUCTION, AND DISTRIBUTION",
            "Grant of Copyright License.",
            "Grant of Patent License.",
            "Redistribution. You may reproduce and distribute copies of the Work or Derivative \
             Works thereof in any medium",
            "Submission of Contributions.",
            "Trademarks. This License does not grant permission to use the trade names",
            "Disclaimer of Warranty.",
            "Limitation of Liability.",
            "Accepting Warranty or Additional Liability.",
            "END OF TERMS AND CONDITIONS",
        ],
        excludes: &[],
    },
    LicenseTemplate {
        id: "MPL-2.0",
        phrases: &[
            "Mozilla Public License Version 2.0",
            "Definitions",
            "Disclaimer of Warranty",
            "Limitation of Liability",
            "Exhibit A - Source Code Form License Notice",
            "This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.",
        ],
        excludes: &[],
    },
    LicenseTemplate {
        id: "GPL-2.0",
        phrases: &[
            "GNU GENERAL PUBLIC LICENSE Version 2, June 1991",
            "TERMS AND CONDITIONS FOR COPYING, DISTRIBUTION AND MODIFICATION",
            "NO WARRANTY",
            "END OF TERMS AND CONDITIONS",
        ],
        excludes: &[],
    },
    LicenseTemplate {
        id: "GPL-3.0",
        phrases: &[
            "GNU GENERAL PUBLIC LICENSE Version 3, 29 June 2007",
            "TERMS AND CONDITIONS",
            "Disclaimer of Warranty.",
            "Limitation of Liability.",
            "END OF TERMS AND CONDITIONS",
        ],
        excludes: &[],
    },
    LicenseTemplate {
        id: "LGPL-2.1",
        phrases: &[
            "GNU LESSER GENERAL PUBLIC LICENSE Version 2.1, February 1999",
            "TERMS AND CONDITIONS FOR COPYING, DISTRIBUTION AND MODIFICATION",
            "NO WARRANTY",
            "END OF TERMS AND CONDITIONS",
        ],
        excludes: &[],
    },
    LicenseTemplate {
        id: "LGPL-3.0",
        phrases: &[
            "GNU LESSER GENERAL PUBLIC LICENSE Version 3, 29 June 2007",
            "Additional Definitions.",
            "Revised Versions of the GNU Lesser General Public License.",
            "permanent authorization for you to choose that version for the Library.",
        ],
        excludes: &[],
    },
    LicenseTemplate {
        id: "AGPL-3.0",
        phrases: &[
            "GNU AFFERO GENERAL PUBLIC LICENSE Version 3, 19 November 2007",
            "TERMS AND CONDITIONS",
            "Remote Network Interaction; Use with the GNU General Public License.",
            "END OF TERMS AND CONDITIONS",
        ],
        excludes: &[],
    },
    LicenseTemplate {
        id: "Unlicense",
        phrases: &[
            "This is free and unencumbered software released into the public domain.",
            "Anyone is free to copy, modify, publish, use, compile, sell, or distribute this \
             software",
            "For more information, please refer to",
        ],
        excludes: &[],
    },
    LicenseTemplate {
        id: "CC0-1.0",
        phrases: &[
            "Creative Commons Legal Code",
            "CC0 1.0 Universal",
            "Statement of Purpose",
            "Waiver.",
            "Public License Fallback.",
            "Limitations and Disclaimers.",
            "has no duty or obligation with respect to this CC0 or use of the Work.",
        ],
        excludes: &[],
    },
];
